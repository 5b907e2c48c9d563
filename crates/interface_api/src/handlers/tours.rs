//! Tour handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::TourId;
use domain_catalog::{ResourceKind, ResourceRef, Tour};

use crate::auth::Claims;
use crate::dto::catalog::*;
use crate::{error::ApiError, AppState};

pub async fn create_tour(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<TourRequest>,
) -> Result<(StatusCode, Json<Tour>), ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let tour = state.catalog.create_tour(request.into_draft(state.currency)?).await?;
    Ok((StatusCode::CREATED, Json(tour)))
}

/// Lists tours matching the query string filters, ordered by name
pub async fn search_tours(
    State(state): State<AppState>,
    Query(params): Query<ResourceSearchParams>,
) -> Result<Json<Vec<Tour>>, ApiError> {
    let query = params.into_query(ResourceKind::Tour)?;
    let tours = state
        .catalog
        .find(&query)
        .await?
        .into_iter()
        .filter_map(|r| r.into_tour())
        .collect();
    Ok(Json(tours))
}

pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<TourId>,
) -> Result<Json<Tour>, ApiError> {
    Ok(Json(state.catalog.get_tour(id).await?))
}

pub async fn update_tour(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<TourId>,
    Json(request): Json<TourRequest>,
) -> Result<Json<Tour>, ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let tour = state.catalog.update_tour(id, request.into_draft(state.currency)?).await?;
    Ok(Json(tour))
}

pub async fn delete_tour(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<TourId>,
) -> Result<StatusCode, ApiError> {
    claims.require_admin()?;
    state.catalog.delete_resource(ResourceRef::Tour(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
