//! Booking State Machine
//!
//! Drives a booking through PENDING → CONFIRMED | CANCELLED and keeps the
//! inventory ledger in step with it. A booking's quantity is deducted from
//! its resource for as long as the booking is PENDING or CONFIRMED, and is
//! returned exactly once: on cancel, or on delete while PENDING.
//!
//! Operations on the same booking are serialized. When the booking write
//! fails after the ledger has already moved units, the ledger adjustment is
//! compensated before the error is returned, so from the caller's side the
//! operation either happened as a whole or not at all.

use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use core_kernel::{validation, BookingId, Clock, Currency, KeyedLocks, Money, UserId};
use domain_catalog::{InventoryLedger, ResourceRef};
use domain_user::UserPort;

use crate::booking::{Booking, BookingRequest, BookingStatus, BookingUpdate};
use crate::error::BookingError;
use crate::ports::{BookingPayments, BookingPort};

pub struct BookingService {
    port: Arc<dyn BookingPort>,
    users: Arc<dyn UserPort>,
    ledger: Arc<InventoryLedger>,
    payments: Arc<dyn BookingPayments>,
    clock: Arc<dyn Clock>,
    currency: Currency,
    locks: KeyedLocks<BookingId>,
}

impl BookingService {
    pub fn new(
        port: Arc<dyn BookingPort>,
        users: Arc<dyn UserPort>,
        ledger: Arc<InventoryLedger>,
        payments: Arc<dyn BookingPayments>,
        clock: Arc<dyn Clock>,
        currency: Currency,
    ) -> Self {
        Self {
            port,
            users,
            ledger,
            payments,
            clock,
            currency,
            locks: KeyedLocks::new(),
        }
    }

    /// Reserves inventory and records a PENDING booking.
    ///
    /// The booking is stored while the resource lock is held. If the
    /// reservation is rejected no booking is created; if the booking cannot
    /// be stored the units are returned.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, resource = %request.resource))]
    pub async fn create(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let quantity = validation::positive_quantity("quantity", request.quantity)?;
        let special_requests = normalize(request.special_requests);

        if !self.users.exists(request.user_id).await? {
            return Err(BookingError::UserNotFound(request.user_id));
        }

        let user_id = request.user_id;
        let resource = request.resource;
        self.ledger
            .reserve_with(resource, i64::from(quantity), |reserved| async move {
                let booking = Booking::new(
                    user_id,
                    resource,
                    quantity,
                    reserved.unit_price(),
                    special_requests,
                    self.clock.now(),
                )?;
                let booking = self.port.insert_booking(&booking).await?;
                info!(
                    booking_id = %booking.id,
                    quantity,
                    available = reserved.available(),
                    "Booking created"
                );
                Ok::<_, BookingError>(booking)
            })
            .await
    }

    /// Changes the quantity and special requests of a PENDING booking.
    ///
    /// A larger quantity reserves the difference, a smaller one releases it.
    #[instrument(skip(self, changes), fields(booking_id = %id))]
    pub async fn update(&self, id: BookingId, changes: BookingUpdate) -> Result<Booking, BookingError> {
        let quantity = validation::positive_quantity("quantity", changes.quantity)?;
        let special_requests = normalize(changes.special_requests);
        let _guard = self.locks.lock(&id).await;

        let mut booking = self.load(id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::UpdateNotAllowed {
                booking_id: id,
                status: booking.status,
            });
        }

        let delta = i64::from(quantity) - i64::from(booking.quantity);
        if delta > 0 {
            self.ledger.reserve(booking.resource, delta).await?;
        } else if delta < 0 {
            self.ledger.release(booking.resource, -delta).await?;
        }

        let resource = booking.resource;
        let result = match booking.set_quantity(quantity) {
            Ok(()) => {
                booking.special_requests = special_requests;
                booking.updated_at = self.clock.now();
                self.port.update_booking(&booking).await.map_err(BookingError::from)
            }
            Err(e) => Err(BookingError::from(e)),
        };

        match result {
            Ok(saved) => {
                info!(quantity, delta, version = saved.version, "Booking updated");
                Ok(saved)
            }
            Err(e) => {
                if delta > 0 {
                    self.compensate_release(resource, delta.unsigned_abs() as u32).await;
                } else if delta < 0 {
                    self.compensate_reclaim(resource, delta.unsigned_abs() as u32).await;
                }
                Err(self.note_conflict(e))
            }
        }
    }

    /// PENDING → CONFIRMED. Inventory was already reserved at creation.
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn confirm(&self, id: BookingId) -> Result<Booking, BookingError> {
        let _guard = self.locks.lock(&id).await;

        let mut booking = self.load(id).await?;
        booking.transition_to(BookingStatus::Confirmed, self.clock.now())?;

        let saved = self
            .port
            .update_booking(&booking)
            .await
            .map_err(|e| self.note_conflict(e.into()))?;
        info!(status = %saved.status, "Booking confirmed");
        Ok(saved)
    }

    /// PENDING | CONFIRMED → CANCELLED, returning the reserved units.
    ///
    /// A second cancel fails with `InvalidTransition` and does not touch
    /// inventory.
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn cancel(&self, id: BookingId) -> Result<Booking, BookingError> {
        let _guard = self.locks.lock(&id).await;

        let mut booking = self.load(id).await?;
        booking.transition_to(BookingStatus::Cancelled, self.clock.now())?;

        let released = self
            .ledger
            .release(booking.resource, i64::from(booking.quantity))
            .await?;

        match self.port.update_booking(&booking).await {
            Ok(saved) => {
                info!(
                    quantity = saved.quantity,
                    available = released.available(),
                    "Booking cancelled"
                );
                Ok(saved)
            }
            Err(e) => {
                self.compensate_reclaim(booking.resource, booking.quantity).await;
                Err(self.note_conflict(e.into()))
            }
        }
    }

    /// Removes a booking. CONFIRMED bookings must be cancelled first and a
    /// booking with payment records is kept; PENDING bookings return their
    /// units before the record is removed.
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn delete(&self, id: BookingId) -> Result<(), BookingError> {
        let _guard = self.locks.lock(&id).await;

        let booking = self.load(id).await?;
        if booking.status == BookingStatus::Confirmed {
            return Err(BookingError::DeletionNotAllowed {
                booking_id: id,
                status: booking.status,
            });
        }
        if self.payments.has_payments(id).await? {
            return Err(BookingError::HasPayments { booking_id: id });
        }

        let releases = booking.status == BookingStatus::Pending;
        if releases {
            self.ledger
                .release(booking.resource, i64::from(booking.quantity))
                .await?;
        }

        if let Err(e) = self.port.delete_booking(id, booking.version).await {
            if releases {
                self.compensate_reclaim(booking.resource, booking.quantity).await;
            }
            return Err(self.note_conflict(e.into()));
        }

        info!(status = %booking.status, released = releases, "Booking deleted");
        Ok(())
    }

    /// Runs `f` while holding the booking's lock, excluding every booking
    /// operation on `id` until it completes. `f` must not call back into
    /// this service's mutating operations for the same booking.
    pub async fn exclusive<F, Fut, T>(&self, id: BookingId, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.locks.lock(&id).await;
        f().await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.load(id).await
    }

    pub async fn list(&self) -> Result<Vec<Booking>, BookingError> {
        Ok(self.port.list_bookings().await?)
    }

    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, BookingError> {
        if !self.users.exists(user_id).await? {
            return Err(BookingError::UserNotFound(user_id));
        }
        Ok(self.port.find_by_user(user_id).await?)
    }

    pub async fn list_by_resource(&self, resource: ResourceRef) -> Result<Vec<Booking>, BookingError> {
        self.ledger.get(resource).await?;
        Ok(self.port.find_by_resource(resource).await?)
    }

    pub async fn list_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, BookingError> {
        Ok(self.port.find_by_status(status).await?)
    }

    pub async fn pending(&self) -> Result<Vec<Booking>, BookingError> {
        self.list_by_status(BookingStatus::Pending).await
    }

    pub async fn confirmed(&self) -> Result<Vec<Booking>, BookingError> {
        self.list_by_status(BookingStatus::Confirmed).await
    }

    /// Sum of confirmed bookings' totals
    pub async fn total_revenue(&self) -> Result<Money, BookingError> {
        let confirmed = self.confirmed().await?;
        Ok(Money::sum(
            self.currency,
            confirmed.iter().map(|b| &b.total_amount),
        )?)
    }

    pub async fn count(&self) -> Result<usize, BookingError> {
        Ok(self.list().await?.len())
    }

    pub async fn count_by_user(&self, user_id: UserId) -> Result<usize, BookingError> {
        Ok(self.list_by_user(user_id).await?.len())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn load(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.port
            .get_booking(id)
            .await
            .map_err(|e| BookingError::from_lookup(id, e))
    }

    fn note_conflict(&self, err: BookingError) -> BookingError {
        if let BookingError::Port(ref port_err) = err {
            if port_err.is_conflict() {
                warn!("Concurrent write on booking");
            }
        }
        err
    }

    /// Undoes a reservation made by an operation that then failed
    async fn compensate_release(&self, resource: ResourceRef, quantity: u32) {
        if let Err(e) = self.ledger.release(resource, i64::from(quantity)).await {
            error!(%resource, quantity, error = %e, "Failed to release units after aborted booking write");
        }
    }

    /// Undoes a release made by an operation that then failed
    async fn compensate_reclaim(&self, resource: ResourceRef, quantity: u32) {
        if let Err(e) = self.ledger.reclaim(resource, i64::from(quantity)).await {
            error!(%resource, quantity, error = %e, "Failed to reclaim units after aborted booking write");
        }
    }
}

fn normalize(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{MockBookingPayments, MockBookingPort};
    use chrono::{NaiveDate, Utc};
    use core_kernel::{Classify, ErrorKind, FixedClock, TourId};
    use domain_catalog::{BookableResource, CatalogPort, MockCatalogPort, Tour};
    use domain_user::{MockUserPort, User, UserRole};
    use rust_decimal_macros::dec;

    struct Fixture {
        service: BookingService,
        bookings: Arc<MockBookingPort>,
        payments: Arc<MockBookingPayments>,
        catalog: Arc<MockCatalogPort>,
        user_id: UserId,
        tour: ResourceRef,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    async fn fixture(capacity: u32) -> Fixture {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: "Hira".to_string(),
            email: "hira@example.com".to_string(),
            phone: None,
            address: None,
            role: UserRole::Customer,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let tour = Tour {
            id: TourId::new(),
            name: "Chitral Kalash Valley".to_string(),
            description: None,
            location_id: None,
            duration_days: 6,
            price: Money::new(dec!(100), Currency::USD),
            capacity,
            available: capacity,
            start_date: today() + chrono::Duration::days(30),
            end_date: today() + chrono::Duration::days(36),
            guide: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let tour_ref = ResourceRef::Tour(tour.id);

        let bookings = Arc::new(MockBookingPort::new());
        let catalog = Arc::new(MockCatalogPort::with_resources(vec![BookableResource::Tour(tour)]).await);
        let users = Arc::new(MockUserPort::with_users(vec![user.clone()]).await);
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_date(today()));
        let ledger = Arc::new(InventoryLedger::new(catalog.clone(), clock.clone()));
        let payments = Arc::new(MockBookingPayments::new());

        Fixture {
            service: BookingService::new(
                bookings.clone(),
                users,
                ledger,
                payments.clone(),
                clock,
                Currency::USD,
            ),
            bookings,
            payments,
            catalog,
            user_id: user.id,
            tour: tour_ref,
        }
    }

    impl Fixture {
        fn request(&self, quantity: i64) -> BookingRequest {
            BookingRequest {
                user_id: self.user_id,
                resource: self.tour,
                quantity,
                special_requests: None,
            }
        }

        async fn available(&self) -> u32 {
            self.catalog.get_resource(self.tour).await.unwrap().available()
        }
    }

    #[tokio::test]
    async fn test_create_then_confirm_keeps_reservation() {
        let f = fixture(10).await;

        let booking = f.service.create(f.request(4)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_amount.amount(), dec!(400));
        assert_eq!(f.available().await, 6);

        let confirmed = f.service.confirm(booking.id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(f.available().await, 6);
    }

    #[tokio::test]
    async fn test_create_over_capacity_creates_nothing() {
        let f = fixture(10).await;
        f.service.create(f.request(4)).await.unwrap();

        let err = f.service.create(f.request(8)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientCapacity);
        assert_eq!(f.available().await, 6);
        assert_eq!(f.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_existing_user() {
        let f = fixture(10).await;
        let mut request = f.request(1);
        request.user_id = UserId::new();

        let err = f.service.create(request).await.unwrap_err();
        assert!(matches!(err, BookingError::UserNotFound(_)));
        assert_eq!(f.available().await, 10);
    }

    #[tokio::test]
    async fn test_create_requires_existing_resource() {
        let f = fixture(10).await;
        let mut request = f.request(1);
        request.resource = ResourceRef::Tour(TourId::new());

        let err = f.service.create(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_releases_once() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(4)).await.unwrap();

        let cancelled = f.service.cancel(booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(f.available().await, 10);

        let err = f.service.cancel(booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(f.available().await, 10);
    }

    #[tokio::test]
    async fn test_cancel_confirmed_booking_releases() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(3)).await.unwrap();
        f.service.confirm(booking.id).await.unwrap();

        f.service.cancel(booking.id).await.unwrap();
        assert_eq!(f.available().await, 10);
    }

    #[tokio::test]
    async fn test_confirm_only_from_pending() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(1)).await.unwrap();
        f.service.cancel(booking.id).await.unwrap();

        let err = f.service.confirm(booking.id).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_adjusts_inventory_by_delta() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(4)).await.unwrap();

        let grown = f
            .service
            .update(booking.id, BookingUpdate { quantity: 7, special_requests: Some("vegetarian".into()) })
            .await
            .unwrap();
        assert_eq!(grown.total_amount.amount(), dec!(700));
        assert_eq!(grown.special_requests.as_deref(), Some("vegetarian"));
        assert_eq!(f.available().await, 3);

        f.service
            .update(booking.id, BookingUpdate { quantity: 2, special_requests: None })
            .await
            .unwrap();
        assert_eq!(f.available().await, 8);
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_quantity_before_inventory() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(4)).await.unwrap();

        for quantity in [0, -3] {
            let err = f
                .service
                .update(booking.id, BookingUpdate { quantity, special_requests: None })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(f.available().await, 6);
        assert_eq!(f.service.get(booking.id).await.unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_update_not_allowed_once_confirmed() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(4)).await.unwrap();
        f.service.confirm(booking.id).await.unwrap();

        let err = f
            .service
            .update(booking.id, BookingUpdate { quantity: 5, special_requests: None })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpdateNotAllowed);
        assert_eq!(f.available().await, 6);
    }

    #[tokio::test]
    async fn test_update_compensates_when_save_fails() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(4)).await.unwrap();

        f.bookings.fail_next_save();
        let err = f
            .service
            .update(booking.id, BookingUpdate { quantity: 6, special_requests: None })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(f.available().await, 6);

        f.bookings.fail_next_save();
        f.service
            .update(booking.id, BookingUpdate { quantity: 1, special_requests: None })
            .await
            .unwrap_err();
        assert_eq!(f.available().await, 6);
    }

    #[tokio::test]
    async fn test_create_compensates_when_insert_fails() {
        let f = fixture(10).await;
        f.bookings.fail_next_save();

        assert!(f.service.create(f.request(4)).await.is_err());
        assert_eq!(f.available().await, 10);
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_compensates_when_save_fails() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(4)).await.unwrap();

        f.bookings.fail_next_save();
        assert!(f.service.cancel(booking.id).await.is_err());
        assert_eq!(f.available().await, 6);
        assert_eq!(
            f.service.get(booking.id).await.unwrap().status,
            BookingStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let f = fixture(10).await;

        let pending = f.service.create(f.request(2)).await.unwrap();
        f.service.delete(pending.id).await.unwrap();
        assert_eq!(f.available().await, 10);

        let confirmed = f.service.create(f.request(3)).await.unwrap();
        f.service.confirm(confirmed.id).await.unwrap();
        let err = f.service.delete(confirmed.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeletionNotAllowed);

        f.service.cancel(confirmed.id).await.unwrap();
        f.service.delete(confirmed.id).await.unwrap();
        assert_eq!(f.available().await, 10);
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_refused_while_payments_reference_booking() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(2)).await.unwrap();
        f.service.cancel(booking.id).await.unwrap();
        f.payments.record(booking.id).await;

        let err = f.service.delete(booking.id).await.unwrap_err();
        assert!(matches!(err, BookingError::HasPayments { .. }));
        assert_eq!(err.kind(), ErrorKind::DeletionNotAllowed);
        assert!(f.service.get(booking.id).await.is_ok());
        assert_eq!(f.available().await, 10);
    }

    #[tokio::test]
    async fn test_delete_compensates_when_remove_fails() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(2)).await.unwrap();

        f.bookings.fail_next_save();
        assert!(f.service.delete(booking.id).await.is_err());
        assert_eq!(f.available().await, 8);
        assert!(f.service.get(booking.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_revenue_counts_confirmed_only() {
        let f = fixture(10).await;
        let a = f.service.create(f.request(2)).await.unwrap();
        f.service.create(f.request(3)).await.unwrap();
        f.service.confirm(a.id).await.unwrap();

        assert_eq!(f.service.total_revenue().await.unwrap().amount(), dec!(200));
        assert_eq!(f.service.pending().await.unwrap().len(), 1);
        assert_eq!(f.service.count_by_user(f.user_id).await.unwrap(), 2);
        assert_eq!(f.service.list_by_resource(f.tour).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancels_release_once() {
        let f = fixture(10).await;
        let booking = f.service.create(f.request(5)).await.unwrap();
        let service = Arc::new(f.service);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.cancel(booking.id).await }));
        }
        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(f.catalog.get_resource(f.tour).await.unwrap().available(), 10);
    }
}
