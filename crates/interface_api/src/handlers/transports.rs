//! Transport handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::TransportId;
use domain_catalog::{BookableResource, ResourceKind, ResourceRef, Transport};

use crate::auth::Claims;
use crate::dto::catalog::*;
use crate::{error::ApiError, AppState};

pub async fn create_transport(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<TransportRequest>,
) -> Result<(StatusCode, Json<Transport>), ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let transport = state
        .catalog
        .create_transport(request.into_draft(state.currency)?)
        .await?;
    Ok((StatusCode::CREATED, Json(transport)))
}

/// Lists transports matching the query string filters. `from` and `to`
/// together select a route.
pub async fn search_transports(
    State(state): State<AppState>,
    Query(params): Query<ResourceSearchParams>,
) -> Result<Json<Vec<Transport>>, ApiError> {
    let query = params.into_query(ResourceKind::Transport)?;

    // A full route goes through the service so both endpoints are checked
    let transports = if let (Some(from), Some(to)) = (query.from_location_id, query.to_location_id) {
        state
            .catalog
            .transports_on_route(from, to)
            .await?
            .into_iter()
            .filter(|t| query.matches(&BookableResource::from(t.clone())))
            .collect()
    } else {
        state
            .catalog
            .find(&query)
            .await?
            .into_iter()
            .filter_map(|r| r.into_transport())
            .collect()
    };
    Ok(Json(transports))
}

pub async fn get_transport(
    State(state): State<AppState>,
    Path(id): Path<TransportId>,
) -> Result<Json<Transport>, ApiError> {
    Ok(Json(state.catalog.get_transport(id).await?))
}

pub async fn update_transport(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<TransportId>,
    Json(request): Json<TransportRequest>,
) -> Result<Json<Transport>, ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let transport = state
        .catalog
        .update_transport(id, request.into_draft(state.currency)?)
        .await?;
    Ok(Json(transport))
}

pub async fn delete_transport(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<TransportId>,
) -> Result<StatusCode, ApiError> {
    claims.require_admin()?;
    state.catalog.delete_resource(ResourceRef::Transport(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
