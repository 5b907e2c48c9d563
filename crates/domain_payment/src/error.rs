//! Payment domain errors

use thiserror::Error;

use core_kernel::{
    BookingId, Classify, ErrorKind, MoneyError, PaymentId, PortError, ValidationError,
};
use domain_booking::BookingError;

use crate::payment::PaymentStatus;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("No payment found for booking {0}")]
    NoPaymentForBooking(BookingId),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Cannot accept a payment for cancelled booking {booking_id}")]
    PaymentNotAllowed { booking_id: BookingId },

    #[error("Payment already completed for booking {booking_id}")]
    PaymentAlreadyExists { booking_id: BookingId },

    #[error("Payment {payment_id} has already been processed ({status})")]
    AlreadyProcessed {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    #[error("Payment {payment_id} failed earlier; create a new payment")]
    Unprocessable { payment_id: PaymentId },

    #[error("Only completed payments can be refunded; {payment_id} is {status}")]
    RefundNotAllowed {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    #[error("Cannot modify a {status} payment ({payment_id})")]
    UpdateNotAllowed {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    #[error("Cannot delete a {status} payment ({payment_id})")]
    DeletionNotAllowed {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    /// Confirming the booking failed; the payment was marked FAILED
    #[error("Payment {payment_id} failed: {source}")]
    SettlementFailed {
        payment_id: PaymentId,
        #[source]
        source: Box<BookingError>,
    },

    #[error("Duplicate transaction id: {0}")]
    DuplicateTransaction(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl PaymentError {
    pub(crate) fn from_lookup(id: PaymentId, err: PortError) -> Self {
        if err.is_not_found() {
            PaymentError::PaymentNotFound(id)
        } else {
            PaymentError::Port(err)
        }
    }
}

impl Classify for PaymentError {
    fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Validation(e) => e.kind(),
            PaymentError::PaymentNotFound(_) | PaymentError::NoPaymentForBooking(_) => {
                ErrorKind::NotFound
            }
            PaymentError::Booking(e) => e.kind(),
            PaymentError::PaymentNotAllowed { .. } => ErrorKind::PaymentNotAllowed,
            PaymentError::PaymentAlreadyExists { .. } => ErrorKind::PaymentAlreadyExists,
            PaymentError::AlreadyProcessed { .. } => ErrorKind::AlreadyProcessed,
            PaymentError::Unprocessable { .. } => ErrorKind::Unprocessable,
            PaymentError::RefundNotAllowed { .. } => ErrorKind::RefundNotAllowed,
            PaymentError::UpdateNotAllowed { .. } => ErrorKind::UpdateNotAllowed,
            PaymentError::DeletionNotAllowed { .. } => ErrorKind::DeletionNotAllowed,
            PaymentError::SettlementFailed { source, .. } => source.kind(),
            PaymentError::DuplicateTransaction(_) => ErrorKind::Duplicate,
            PaymentError::Money(_) => ErrorKind::Internal,
            PaymentError::Port(e) => e.kind(),
        }
    }
}
