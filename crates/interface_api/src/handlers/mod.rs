//! Request handlers, one module per resource

pub mod bookings;
pub mod health;
pub mod inventory;
pub mod locations;
pub mod lodges;
pub mod payments;
pub mod tours;
pub mod transports;
pub mod users;
