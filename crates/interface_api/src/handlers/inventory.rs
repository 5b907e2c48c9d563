//! Inventory availability

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use domain_catalog::{ResourceKind, ResourceRef};

use crate::dto::catalog::{AvailabilityQuery, AvailabilityResponse};
use crate::dto::parse_param;
use crate::{error::ApiError, AppState};

/// Whether `quantity` units of a resource can be booked right now.
/// Read-only; nothing is reserved.
pub async fn availability(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let kind: ResourceKind = parse_param(&kind)?;
    let resource = ResourceRef::from_parts(kind, id);

    let bookable = state.ledger.is_available(resource, query.quantity).await?;
    let current = state.ledger.get(resource).await?;

    Ok(Json(AvailabilityResponse {
        resource,
        requested: query.quantity,
        bookable,
        available: current.available(),
        capacity: current.capacity(),
        utilization: current.utilization(),
    }))
}
