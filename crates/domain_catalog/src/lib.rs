//! Catalog Domain
//!
//! Locations and the three kinds of bookable resource (tours, lodges and
//! transports), plus the [`InventoryLedger`] that owns their remaining-units
//! counters.
//!
//! # Inventory model
//!
//! Every resource has a `capacity` and an `available` counter with
//! `0 <= available <= capacity`. Bookings deduct units through
//! [`InventoryLedger::reserve`] and return them through
//! [`InventoryLedger::release`]; nothing else changes the counter except an
//! administrative edit through [`CatalogService`], which takes the same
//! per-resource lock.
//!
//! # Expiry
//!
//! Tours have a departure date and cannot be reserved once it has passed.
//! Lodges and transports never expire.

pub mod draft;
pub mod error;
pub mod inventory;
pub mod location;
pub mod ports;
pub mod resource;
pub mod service;

pub use draft::{LodgeDraft, TourDraft, TransportDraft};
pub use error::CatalogError;
pub use inventory::InventoryLedger;
pub use location::{Location, LocationDraft};
pub use ports::{ActiveReservations, CatalogPort, ResourceQuery};
pub use resource::{BookableResource, Lodge, ResourceKind, ResourceRef, Tour, Transport};
pub use service::CatalogService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockCatalogPort, MockReservations};
