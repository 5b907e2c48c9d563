//! Booking domain errors

use thiserror::Error;

use core_kernel::{BookingId, Classify, ErrorKind, MoneyError, PortError, UserId, ValidationError};
use domain_catalog::CatalogError;

use crate::booking::BookingStatus;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Reservation or release was rejected by the inventory ledger
    #[error(transparent)]
    Inventory(#[from] CatalogError),

    #[error("Booking {booking_id} cannot move from {from} to {to}")]
    InvalidTransition {
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Cannot update a {status} booking ({booking_id})")]
    UpdateNotAllowed {
        booking_id: BookingId,
        status: BookingStatus,
    },

    #[error("Cannot delete a {status} booking ({booking_id}); cancel it first")]
    DeletionNotAllowed {
        booking_id: BookingId,
        status: BookingStatus,
    },

    /// Payment records still reference the booking
    #[error("Booking {booking_id} has payments; delete them first")]
    HasPayments { booking_id: BookingId },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl BookingError {
    pub(crate) fn from_lookup(id: BookingId, err: PortError) -> Self {
        if err.is_not_found() {
            BookingError::BookingNotFound(id)
        } else {
            BookingError::Port(err)
        }
    }
}

impl Classify for BookingError {
    fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(e) => e.kind(),
            BookingError::BookingNotFound(_) | BookingError::UserNotFound(_) => ErrorKind::NotFound,
            BookingError::Inventory(e) => e.kind(),
            BookingError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            BookingError::UpdateNotAllowed { .. } => ErrorKind::UpdateNotAllowed,
            BookingError::DeletionNotAllowed { .. } | BookingError::HasPayments { .. } => {
                ErrorKind::DeletionNotAllowed
            }
            BookingError::Money(_) => ErrorKind::Internal,
            BookingError::Port(e) => e.kind(),
        }
    }
}
