//! User domain errors

use thiserror::Error;

use core_kernel::{Classify, ErrorKind, PortError, UserId, ValidationError};

/// Errors that can occur in the user domain
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// User with the given ID was not found
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Another user already registered this email
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl UserError {
    /// Maps a port NotFound on a user lookup to `UserNotFound`
    pub(crate) fn from_lookup(id: UserId, err: PortError) -> Self {
        if err.is_not_found() {
            UserError::UserNotFound(id)
        } else {
            UserError::Port(err)
        }
    }
}

impl Classify for UserError {
    fn kind(&self) -> ErrorKind {
        match self {
            UserError::Validation(e) => e.kind(),
            UserError::UserNotFound(_) => ErrorKind::NotFound,
            UserError::DuplicateEmail(_) => ErrorKind::Duplicate,
            UserError::Port(e) => e.kind(),
        }
    }
}
