//! Location handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{LocationId, Money};
use domain_catalog::{Location, LocationDraft};

use crate::auth::Claims;
use crate::dto::catalog::*;
use crate::{error::ApiError, AppState};

pub async fn create_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<LocationRequest>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    claims.require_admin()?;
    request.validate()?;
    let location = state.catalog.create_location(LocationDraft::from(request)).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// Lists locations, by country or keyword when given
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let locations = match (query.country, query.q) {
        (Some(country), _) => state.catalog.list_locations_by_country(&country).await?,
        (None, Some(keyword)) => state.catalog.search_locations(&keyword).await?,
        (None, None) => state.catalog.list_locations().await?,
    };
    Ok(Json(locations))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<LocationId>,
) -> Result<Json<Location>, ApiError> {
    Ok(Json(state.catalog.get_location(id).await?))
}

pub async fn update_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<LocationId>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<Location>, ApiError> {
    claims.require_admin()?;
    request.validate()?;
    Ok(Json(state.catalog.update_location(id, request.into()).await?))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<LocationId>,
) -> Result<StatusCode, ApiError> {
    claims.require_admin()?;
    state.catalog.delete_location(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mean nightly lodge price at a location
pub async fn average_lodge_price(
    State(state): State<AppState>,
    Path(id): Path<LocationId>,
) -> Result<Json<Money>, ApiError> {
    Ok(Json(state.catalog.average_lodge_price(id).await?))
}
