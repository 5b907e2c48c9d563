//! API error handling
//!
//! Domain errors are reported by their [`ErrorKind`], so the HTTP status of a
//! failure is decided in one place regardless of which domain raised it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::{Classify, ErrorKind, ValidationError};
use domain_booking::BookingError;
use domain_catalog::CatalogError;
use domain_payment::PaymentError;
use domain_user::UserError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// A domain operation failed
    #[error("{message}")]
    Domain { kind: ErrorKind, message: String },

    /// The request body failed declarative validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed path or query input
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn from_domain(err: &impl Classify, message: String) -> Self {
        ApiError::Domain {
            kind: err.kind(),
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain { kind, .. } => status_for(*kind),
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Domain { kind, .. } => kind.code(),
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Internal(_) => "internal",
        }
    }
}

/// HTTP status for a domain failure classification
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict
        | ErrorKind::Duplicate
        | ErrorKind::AlreadyProcessed
        | ErrorKind::PaymentAlreadyExists => StatusCode::CONFLICT,
        ErrorKind::InvalidTransition
        | ErrorKind::InsufficientCapacity
        | ErrorKind::CapacityExceeded
        | ErrorKind::Expired
        | ErrorKind::UpdateNotAllowed
        | ErrorKind::DeletionNotAllowed
        | ErrorKind::PaymentNotAllowed
        | ErrorKind::Unprocessable
        | ErrorKind::RefundNotAllowed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

macro_rules! impl_from_domain {
    ($($err:ty),+) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    ApiError::from_domain(&err, err.to_string())
                }
            }
        )+
    };
}

impl_from_domain!(UserError, CatalogError, BookingError, PaymentError, ValidationError);

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
