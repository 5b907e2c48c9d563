//! Payment handlers
//!
//! Customers create and settle payments for their own bookings. Refunds
//! and manual failure marking are admin actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{BookingId, PaymentId};
use domain_payment::{Payment, PaymentMethod, PaymentStatus};

use super::bookings::owned_booking;
use crate::auth::Claims;
use crate::dto::parse_param;
use crate::dto::payment::*;
use crate::{error::ApiError, AppState};

/// Records a PENDING payment against an open booking
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    request.validate()?;
    owned_booking(&state, &claims, request.booking_id).await?;
    let payment = state
        .payments
        .create(request.into_request(state.currency)?)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Lists payments by status or method (admin only)
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    claims.require_admin()?;

    let payments = if let Some(status) = query.status {
        state.payments.list_by_status(parse_param::<PaymentStatus>(&status)?).await?
    } else if let Some(method) = query.method {
        state.payments.list_by_method(parse_param::<PaymentMethod>(&method)?).await?
    } else {
        state.payments.list().await?
    };
    Ok(Json(payments))
}

/// Completed revenue, outstanding amount and payment count (admin only)
pub async fn payment_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PaymentSummary>, ApiError> {
    claims.require_admin()?;
    Ok(Json(PaymentSummary {
        total_revenue: state.payments.total_revenue().await?,
        pending_amount: state.payments.pending_amount().await?,
        count: state.payments.count().await?,
    }))
}

/// Every payment recorded against a booking, oldest first
pub async fn payments_for_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<BookingId>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    owned_booking(&state, &claims, booking_id).await?;
    Ok(Json(state.payments.list_by_booking(booking_id).await?))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(owned_payment(&state, &claims, id).await?))
}

/// Amends amount or method of a PENDING payment
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    request.validate()?;
    owned_payment(&state, &claims, id).await?;
    let payment = state
        .payments
        .update(id, request.into_update(state.currency)?)
        .await?;
    Ok(Json(payment))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
) -> Result<StatusCode, ApiError> {
    owned_payment(&state, &claims, id).await?;
    state.payments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Settles the payment and confirms its booking
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ApiError> {
    owned_payment(&state, &claims, id).await?;
    Ok(Json(state.payments.process(id).await?))
}

/// Refunds a COMPLETED payment and cancels its booking (admin only)
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ApiError> {
    claims.require_admin()?;
    Ok(Json(state.payments.refund(id).await?))
}

/// Marks a PENDING payment FAILED (admin only)
pub async fn fail_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<PaymentId>,
    Json(request): Json<FailPaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    claims.require_admin()?;
    request.validate()?;
    Ok(Json(state.payments.mark_failed(id, request.reason).await?))
}

/// Loads a payment whose booking the caller owns
async fn owned_payment(
    state: &AppState,
    claims: &Claims,
    id: PaymentId,
) -> Result<Payment, ApiError> {
    let payment = state.payments.get(id).await?;
    if !claims.is_admin() {
        owned_booking(state, claims, payment.booking_id).await?;
    }
    Ok(payment)
}
