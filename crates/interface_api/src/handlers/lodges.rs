//! Lodge handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::LodgeId;
use domain_catalog::{Lodge, ResourceKind, ResourceRef};

use crate::auth::Claims;
use crate::dto::catalog::*;
use crate::{error::ApiError, AppState};

pub async fn create_lodge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<LodgeRequest>,
) -> Result<(StatusCode, Json<Lodge>), ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let lodge = state.catalog.create_lodge(request.into_draft(state.currency)?).await?;
    Ok((StatusCode::CREATED, Json(lodge)))
}

/// Lists lodges matching the query string filters, ordered by name
pub async fn search_lodges(
    State(state): State<AppState>,
    Query(params): Query<ResourceSearchParams>,
) -> Result<Json<Vec<Lodge>>, ApiError> {
    let query = params.into_query(ResourceKind::Lodge)?;
    let lodges = state
        .catalog
        .find(&query)
        .await?
        .into_iter()
        .filter_map(|r| r.into_lodge())
        .collect();
    Ok(Json(lodges))
}

/// Rated lodges, best first
pub async fn top_rated_lodges(State(state): State<AppState>) -> Result<Json<Vec<Lodge>>, ApiError> {
    Ok(Json(state.catalog.top_rated_lodges().await?))
}

pub async fn get_lodge(
    State(state): State<AppState>,
    Path(id): Path<LodgeId>,
) -> Result<Json<Lodge>, ApiError> {
    Ok(Json(state.catalog.get_lodge(id).await?))
}

pub async fn update_lodge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<LodgeId>,
    Json(request): Json<LodgeRequest>,
) -> Result<Json<Lodge>, ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let lodge = state.catalog.update_lodge(id, request.into_draft(state.currency)?).await?;
    Ok(Json(lodge))
}

pub async fn delete_lodge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<LodgeId>,
) -> Result<StatusCode, ApiError> {
    claims.require_admin()?;
    state.catalog.delete_resource(ResourceRef::Lodge(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
