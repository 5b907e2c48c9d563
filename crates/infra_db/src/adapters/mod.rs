//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter maps its
//! tables onto private `*Row` structs and converts them into domain types,
//! rejecting rows the domain could not have written (unknown currency,
//! negative counters) as corrupt.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBookingAdapter;
//! use domain_booking::BookingPort;
//!
//! let port: Arc<dyn BookingPort> = Arc::new(PostgresBookingAdapter::new(pool));
//! ```

pub mod booking;
pub mod catalog;
pub mod payment;
pub mod user;

pub use booking::PostgresBookingAdapter;
pub use catalog::PostgresCatalogAdapter;
pub use payment::PostgresPaymentAdapter;
pub use user::PostgresUserAdapter;

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Instant;

use core_kernel::{Currency, HealthCheckResult, Money, PortError};

use crate::error::DatabaseError;

/// Runs `SELECT 1` and reports the round-trip latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}

pub(crate) fn money(amount: Decimal, currency: &str) -> Result<Money, PortError> {
    let currency = Currency::from_str(currency).map_err(|e| corrupt("currency", e))?;
    Ok(Money::new(amount, currency))
}

/// Counters are stored as BIGINT and must fit `u32`
pub(crate) fn count(column: &str, value: i64) -> Result<u32, PortError> {
    u32::try_from(value).map_err(|_| corrupt(column, format!("{} is out of range", value)))
}

/// Parses an enum stored as text
pub(crate) fn parse<T: FromStr<Err = String>>(column: &str, value: &str) -> Result<T, PortError> {
    value.parse().map_err(|e: String| corrupt(column, e))
}

pub(crate) fn corrupt(column: &str, detail: impl Display) -> PortError {
    DatabaseError::corrupt(column, detail).into()
}

/// Resolves a compare-and-set that matched no row
pub(crate) fn stale_or_missing(exists: bool, entity: &str, id: impl Display, version: i64) -> PortError {
    if exists {
        PortError::conflict(entity, id, version)
    } else {
        PortError::not_found(entity, id)
    }
}
