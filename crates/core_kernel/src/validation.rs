//! Validation layer
//!
//! Stateless precondition checks invoked at the top of every mutating
//! operation, before any collaborator is touched. Each check either returns
//! the value in its validated form (a raw `i64` quantity becomes a `u32`, a
//! string comes back trimmed) or a [`ValidationError`] naming the field.
//!
//! # Example
//!
//! ```rust
//! use core_kernel::validation;
//!
//! let quantity = validation::positive_quantity("quantity", 4).unwrap();
//! assert_eq!(quantity, 4u32);
//!
//! let err = validation::positive_quantity("quantity", -1).unwrap_err();
//! assert_eq!(err.field, "quantity");
//! ```

use rust_decimal::Decimal;
use std::fmt::Display;
use thiserror::Error;

use crate::error::{Classify, ErrorKind};
use crate::money::Money;

/// A failed precondition on a single input field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Classify for ValidationError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A quantity of people, seats or rooms: must be > 0 and fit in `u32`
pub fn positive_quantity(field: &str, value: i64) -> ValidationResult<u32> {
    if value <= 0 {
        return Err(ValidationError::new(field, "must be positive"));
    }
    u32::try_from(value).map_err(|_| ValidationError::new(field, "is too large"))
}

/// A counter that may be zero (e.g. remaining seats)
pub fn non_negative_count(field: &str, value: i64) -> ValidationResult<u32> {
    if value < 0 {
        return Err(ValidationError::new(field, "cannot be negative"));
    }
    u32::try_from(value).map_err(|_| ValidationError::new(field, "is too large"))
}

/// Rejects missing or whitespace-only text and returns it trimmed
pub fn non_blank(field: &str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// Like [`non_blank`] for optional inputs
pub fn required<T>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::new(field, "is required"))
}

pub fn non_negative_money(field: &str, value: &Money) -> ValidationResult<()> {
    if value.is_negative() {
        return Err(ValidationError::new(field, "must be non-negative"));
    }
    Ok(())
}

pub fn positive_money(field: &str, value: &Money) -> ValidationResult<()> {
    if !value.is_positive() {
        return Err(ValidationError::new(field, "must be positive"));
    }
    Ok(())
}

/// Inclusive bounds check, e.g. a rating between 0 and 5
pub fn within(field: &str, value: Decimal, min: Decimal, max: Decimal) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// Checks that `low <= high` for a pair of bounds
pub fn ordered<T: PartialOrd + Display>(field: &str, low: &T, high: &T) -> ValidationResult<()> {
    if low > high {
        return Err(ValidationError::new(
            field,
            format!("lower bound {} is after upper bound {}", low, high),
        ));
    }
    Ok(())
}

/// A price range filter: both bounds non-negative and ordered
pub fn price_range(field: &str, min: Decimal, max: Decimal) -> ValidationResult<()> {
    if min.is_sign_negative() && !min.is_zero() || max.is_sign_negative() && !max.is_zero() {
        return Err(ValidationError::new(field, "bounds must be non-negative"));
    }
    ordered(field, &min, &max)
}

/// Remaining units can never exceed total units
pub fn available_within_capacity(available: u32, capacity: u32) -> ValidationResult<()> {
    if available > capacity {
        return Err(ValidationError::new(
            "available",
            format!("{} exceeds capacity {}", available, capacity),
        ));
    }
    Ok(())
}

/// Minimal structural email check; normalizes to lowercase
pub fn email(field: &str, value: &str) -> ValidationResult<String> {
    let value = non_blank(field, value)?;
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::new(field, "is not a valid email address"));
    }
    Ok(value.to_ascii_lowercase())
}
