//! Booking handlers
//!
//! Customers act on their own bookings; admins on anyone's.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::BookingId;
use domain_booking::{Booking, BookingRequest, BookingStatus};
use domain_catalog::{ResourceKind, ResourceRef};

use crate::auth::Claims;
use crate::dto::booking::*;
use crate::dto::parse_param;
use crate::{error::ApiError, AppState};

/// Reserves inventory and creates a PENDING booking
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    request.validate()?;
    let user_id = match request.user_id {
        Some(user_id) => {
            claims.require_self_or_admin(user_id)?;
            user_id
        }
        None => claims.user_id()?,
    };

    let booking = state
        .bookings
        .create(BookingRequest {
            user_id,
            resource: request.resource,
            quantity: request.quantity,
            special_requests: request.special_requests,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Lists bookings by status, user or resource (admin only)
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    claims.require_admin()?;

    let bookings = if let Some(status) = query.status {
        state.bookings.list_by_status(parse_param::<BookingStatus>(&status)?).await?
    } else if let Some(user_id) = query.user_id {
        state.bookings.list_by_user(user_id).await?
    } else if let (Some(kind), Some(id)) = (query.resource_kind, query.resource_id) {
        let kind: ResourceKind = parse_param(&kind)?;
        state.bookings.list_by_resource(ResourceRef::from_parts(kind, id)).await?
    } else {
        state.bookings.list().await?
    };
    Ok(Json(bookings))
}

/// The caller's bookings, oldest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.bookings.list_by_user(claims.user_id()?).await?))
}

/// Confirmed revenue and booking count (admin only)
pub async fn booking_revenue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BookingStats>, ApiError> {
    claims.require_admin()?;
    Ok(Json(BookingStats {
        total_revenue: state.bookings.total_revenue().await?,
        count: state.bookings.count().await?,
    }))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(owned_booking(&state, &claims, id).await?))
}

/// Changes quantity or special requests of a PENDING booking
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    request.validate()?;
    owned_booking(&state, &claims, id).await?;
    Ok(Json(state.bookings.update(id, request.into()).await?))
}

pub async fn confirm_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, ApiError> {
    owned_booking(&state, &claims, id).await?;
    Ok(Json(state.bookings.confirm(id).await?))
}

/// Cancels the booking and returns its units to inventory
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, ApiError> {
    owned_booking(&state, &claims, id).await?;
    Ok(Json(state.bookings.cancel(id).await?))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<BookingId>,
) -> Result<StatusCode, ApiError> {
    owned_booking(&state, &claims, id).await?;
    state.bookings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Loads a booking the caller is allowed to act on
pub(crate) async fn owned_booking(
    state: &AppState,
    claims: &Claims,
    id: BookingId,
) -> Result<Booking, ApiError> {
    let booking = state.bookings.get(id).await?;
    claims.require_self_or_admin(booking.user_id)?;
    Ok(booking)
}
