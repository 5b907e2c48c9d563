//! Booking Domain Ports

use async_trait::async_trait;
use std::sync::Arc;

use core_kernel::{BookingId, DomainPort, HealthCheckable, PortError, UserId};
use domain_catalog::{ActiveReservations, ResourceRef};

use crate::booking::{Booking, BookingStatus};

#[async_trait]
pub trait BookingPort: DomainPort + HealthCheckable {
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError>;

    /// All bookings, oldest first
    async fn list_bookings(&self) -> Result<Vec<Booking>, PortError>;

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, PortError>;

    async fn find_by_resource(&self, resource: ResourceRef) -> Result<Vec<Booking>, PortError>;

    async fn find_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, PortError>;

    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, PortError>;

    /// Compare-and-set on `booking.version`
    async fn update_booking(&self, booking: &Booking) -> Result<Booking, PortError>;

    /// Deletes the booking if its stored version still equals `version`
    async fn delete_booking(&self, id: BookingId, version: i64) -> Result<(), PortError>;
}

/// Answers whether payment records reference a booking.
///
/// Implemented by the payment side; a booking with payments is never
/// deleted, so settled payments cannot lose their booking.
#[async_trait]
pub trait BookingPayments: Send + Sync {
    async fn has_payments(&self, booking_id: BookingId) -> Result<bool, PortError>;
}

/// Bookings that still hold inventory, as seen by the catalog
pub struct LiveBookings {
    port: Arc<dyn BookingPort>,
}

impl LiveBookings {
    pub fn new(port: Arc<dyn BookingPort>) -> Self {
        Self { port }
    }
}

#[async_trait]
impl ActiveReservations for LiveBookings {
    async fn has_active(&self, resource: ResourceRef) -> Result<bool, PortError> {
        let bookings = self.port.find_by_resource(resource).await?;
        Ok(bookings.iter().any(|b| b.status.holds_inventory()))
    }
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory mock implementation of BookingPort
    #[derive(Debug, Default)]
    pub struct MockBookingPort {
        bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
        fail_next_save: AtomicBool,
    }

    impl MockBookingPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next insert, update or delete fails with a connection error
        pub fn fail_next_save(&self) {
            self.fail_next_save.store(true, Ordering::SeqCst);
        }

        fn injected_failure(&self) -> Result<(), PortError> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(PortError::connection("injected save failure"));
            }
            Ok(())
        }

        async fn filtered(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
            let mut found: Vec<_> = self
                .bookings
                .read()
                .await
                .values()
                .filter(|b| predicate(b))
                .cloned()
                .collect();
            found.sort_by_key(|b| (b.booking_date, *b.id.as_uuid()));
            found
        }
    }

    impl DomainPort for MockBookingPort {}

    /// Payment index with explicitly marked bookings
    #[derive(Debug, Default)]
    pub struct MockBookingPayments {
        paid: RwLock<std::collections::HashSet<BookingId>>,
    }

    impl MockBookingPayments {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn record(&self, booking_id: BookingId) {
            self.paid.write().await.insert(booking_id);
        }
    }

    #[async_trait]
    impl BookingPayments for MockBookingPayments {
        async fn has_payments(&self, booking_id: BookingId) -> Result<bool, PortError> {
            Ok(self.paid.read().await.contains(&booking_id))
        }
    }

    #[async_trait]
    impl HealthCheckable for MockBookingPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-booking-port", 0)
        }
    }

    #[async_trait]
    impl BookingPort for MockBookingPort {
        async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
            self.bookings
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Booking", id))
        }

        async fn list_bookings(&self) -> Result<Vec<Booking>, PortError> {
            Ok(self.filtered(|_| true).await)
        }

        async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, PortError> {
            Ok(self.filtered(|b| b.user_id == user_id).await)
        }

        async fn find_by_resource(&self, resource: ResourceRef) -> Result<Vec<Booking>, PortError> {
            Ok(self.filtered(|b| b.resource == resource).await)
        }

        async fn find_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, PortError> {
            Ok(self.filtered(|b| b.status == status).await)
        }

        async fn insert_booking(&self, booking: &Booking) -> Result<Booking, PortError> {
            self.injected_failure()?;
            let mut bookings = self.bookings.write().await;
            if bookings.contains_key(&booking.id) {
                return Err(PortError::duplicate(format!("booking {}", booking.id)));
            }
            bookings.insert(booking.id, booking.clone());
            Ok(booking.clone())
        }

        async fn update_booking(&self, booking: &Booking) -> Result<Booking, PortError> {
            self.injected_failure()?;
            let mut bookings = self.bookings.write().await;
            let stored = bookings
                .get(&booking.id)
                .ok_or_else(|| PortError::not_found("Booking", booking.id))?;
            if stored.version != booking.version {
                return Err(PortError::conflict("Booking", booking.id, booking.version));
            }
            let mut saved = booking.clone();
            saved.version += 1;
            bookings.insert(saved.id, saved.clone());
            Ok(saved)
        }

        async fn delete_booking(&self, id: BookingId, version: i64) -> Result<(), PortError> {
            self.injected_failure()?;
            let mut bookings = self.bookings.write().await;
            let stored = bookings
                .get(&id)
                .ok_or_else(|| PortError::not_found("Booking", id))?;
            if stored.version != version {
                return Err(PortError::conflict("Booking", id, version));
            }
            bookings.remove(&id);
            Ok(())
        }
    }
}
