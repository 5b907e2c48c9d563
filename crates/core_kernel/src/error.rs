//! Error taxonomy shared by every domain crate
//!
//! Each domain owns its own `thiserror` enum. What they share is the
//! [`ErrorKind`] classification, which lets an outer layer (HTTP, CLI, a
//! message consumer) decide how to report a failure without matching on
//! domain-specific variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-neutral classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Precondition failure; not retryable without correcting the input
    InvalidInput,
    /// A referenced entity does not exist
    NotFound,
    /// State machine rule violation
    InvalidTransition,
    /// Not enough remaining units to reserve
    InsufficientCapacity,
    /// Releasing would push `available` above `capacity`
    CapacityExceeded,
    /// The resource can no longer be booked (a tour that already started)
    Expired,
    /// The entity is in a state that forbids modification
    UpdateNotAllowed,
    /// The entity is in a state that forbids deletion
    DeletionNotAllowed,
    /// The booking cannot accept a payment
    PaymentNotAllowed,
    /// A completed payment already exists for the booking
    PaymentAlreadyExists,
    /// The payment was already settled
    AlreadyProcessed,
    /// The payment can never be processed (it failed earlier)
    Unprocessable,
    /// Only completed payments can be refunded
    RefundNotAllowed,
    /// A uniqueness constraint would be violated
    Duplicate,
    /// Concurrent write detected; the caller may retry
    Conflict,
    /// A collaborator is unreachable or timed out
    Unavailable,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Stable snake_case code for wire formats and logs
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::InsufficientCapacity => "insufficient_capacity",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::Expired => "expired",
            ErrorKind::UpdateNotAllowed => "update_not_allowed",
            ErrorKind::DeletionNotAllowed => "deletion_not_allowed",
            ErrorKind::PaymentNotAllowed => "payment_not_allowed",
            ErrorKind::PaymentAlreadyExists => "payment_already_exists",
            ErrorKind::AlreadyProcessed => "already_processed",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::RefundNotAllowed => "refund_not_allowed",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        }
    }

    /// Returns true if retrying the same request unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict | ErrorKind::Unavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Implemented by every domain error so callers can classify it
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}
