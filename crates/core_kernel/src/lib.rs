//! Core Kernel - Foundational types shared by every travel-booking crate
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - The validation layer and the shared error classification
//! - Port plumbing, the clock abstraction and per-key locking

pub mod clock;
pub mod error;
pub mod identifiers;
pub mod locks;
pub mod money;
pub mod ports;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Classify, ErrorKind};
pub use identifiers::{
    BookingId, LocationId, LodgeId, PaymentId, TourId, TransportId, UserId,
};
pub use locks::KeyedLocks;
pub use money::{Currency, Money, MoneyError};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use validation::ValidationError;
