//! Booking Domain
//!
//! The [`Booking`] entity and the [`BookingService`] state machine that
//! couples its lifecycle to the catalog's inventory ledger.
//!
//! # Examples
//!
//! ```rust,ignore
//! let booking = bookings
//!     .create(BookingRequest {
//!         user_id,
//!         resource: ResourceRef::Tour(tour_id),
//!         quantity: 4,
//!         special_requests: None,
//!     })
//!     .await?;
//! bookings.confirm(booking.id).await?;
//! ```

pub mod booking;
pub mod error;
pub mod ports;
pub mod service;

pub use booking::{Booking, BookingRequest, BookingStatus, BookingUpdate};
pub use error::BookingError;
pub use ports::{BookingPayments, BookingPort, LiveBookings};
pub use service::BookingService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockBookingPayments, MockBookingPort};
