//! User Directory Domain
//!
//! Travellers and administrators who own bookings. Authentication lives in
//! the transport layer; this crate only answers "who is this user" and
//! "does this user exist" for the booking domain.
//!
//! # Examples
//!
//! ```rust,ignore
//! use domain_user::{NewUser, UserRole, UserService};
//!
//! let user = service
//!     .register(NewUser::new("Ayesha Khan", "ayesha@example.com", UserRole::Customer))
//!     .await?;
//! assert!(service.exists(user.id).await?);
//! ```

pub mod error;
pub mod ports;
pub mod service;
pub mod user;

pub use error::UserError;
pub use ports::UserPort;
pub use service::UserService;
pub use user::{NewUser, User, UserRole, UserUpdate};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockUserPort;
