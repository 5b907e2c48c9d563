//! Payment Domain
//!
//! Payments move PENDING → COMPLETED | FAILED and COMPLETED → REFUNDED.
//! Completing a payment confirms its booking and refunding it cancels the
//! booking; [`PaymentService`] keeps the two in step so that a COMPLETED
//! payment always belongs to a CONFIRMED booking.

pub mod error;
pub mod payment;
pub mod ports;
pub mod service;

pub use error::PaymentError;
pub use payment::{Payment, PaymentMethod, PaymentRequest, PaymentStatus, PaymentUpdate};
pub use ports::{PaymentPort, PaymentRecords};
pub use service::PaymentService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockPaymentPort;
