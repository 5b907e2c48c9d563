//! Inventory Ledger
//!
//! Owns the remaining-units counter of every bookable resource. All counter
//! mutations go through here and are serialized per resource: the ledger
//! takes the resource's lock, loads the current state, checks the bound,
//! and writes back with a compare-and-set on `version`. A version mismatch
//! means another process wrote the row in between; it surfaces as a
//! `Conflict` for the caller to retry.
//!
//! Invariant after every operation: `0 <= available <= capacity`.

use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use core_kernel::{validation, Clock, KeyedLocks};

use crate::error::CatalogError;
use crate::ports::CatalogPort;
use crate::resource::{BookableResource, ResourceRef};

pub struct InventoryLedger {
    port: Arc<dyn CatalogPort>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks<ResourceRef>,
}

impl InventoryLedger {
    pub fn new(port: Arc<dyn CatalogPort>, clock: Arc<dyn Clock>) -> Self {
        Self {
            port,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    /// Deducts `quantity` units from the resource.
    ///
    /// Checks run in order: quantity must be positive, enough units must
    /// remain, and the resource must not have expired (tours only).
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn reserve(
        &self,
        resource: ResourceRef,
        quantity: i64,
    ) -> Result<BookableResource, CatalogError> {
        let quantity = validation::positive_quantity("quantity", quantity)?;
        let _guard = self.locks.lock(&resource).await;
        self.deduct(resource, quantity).await
    }

    /// Reserves like [`reserve`](Self::reserve), then runs `record` with the
    /// updated resource while still holding the resource lock.
    ///
    /// If `record` fails the units are returned before the lock is dropped,
    /// so other callers never observe the interim deduction.
    #[instrument(skip(self, record), fields(resource = %resource))]
    pub async fn reserve_with<F, Fut, T, E>(
        &self,
        resource: ResourceRef,
        quantity: i64,
        record: F,
    ) -> Result<T, E>
    where
        F: FnOnce(BookableResource) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CatalogError>,
    {
        let quantity = validation::positive_quantity("quantity", quantity).map_err(CatalogError::from)?;
        let _guard = self.locks.lock(&resource).await;

        let reserved = self.deduct(resource, quantity).await?;
        match record(reserved).await {
            Ok(recorded) => Ok(recorded),
            Err(e) => {
                if let Err(undo) = self.restore(resource, quantity).await {
                    error!(quantity, error = %undo, "Failed to return units after aborted write");
                }
                Err(e)
            }
        }
    }

    /// Returns `quantity` units to the resource.
    ///
    /// Fails with `CapacityExceeded` if that would leave more units available
    /// than the resource has.
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn release(
        &self,
        resource: ResourceRef,
        quantity: i64,
    ) -> Result<BookableResource, CatalogError> {
        let quantity = validation::positive_quantity("quantity", quantity)?;
        let _guard = self.locks.lock(&resource).await;
        self.restore(resource, quantity).await
    }

    /// Re-deducts units that were released by an operation which then failed
    /// to persist. Skips the expiry policy: the units belonged to a booking
    /// that already existed before the tour started.
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn reclaim(
        &self,
        resource: ResourceRef,
        quantity: i64,
    ) -> Result<BookableResource, CatalogError> {
        let quantity = validation::positive_quantity("quantity", quantity)?;
        let _guard = self.locks.lock(&resource).await;

        let mut current = self.load(resource).await?;
        let available = current.available();
        if available < quantity {
            return Err(CatalogError::InsufficientCapacity {
                resource,
                requested: quantity,
                available,
            });
        }

        current.set_available(available - quantity, self.clock.now());
        let saved = self.store(&current).await?;
        info!(quantity, available = saved.available(), "Units reclaimed");
        Ok(saved)
    }

    /// Pure read: enough units remain and the resource has not expired
    pub async fn is_available(
        &self,
        resource: ResourceRef,
        quantity: i64,
    ) -> Result<bool, CatalogError> {
        let quantity = validation::positive_quantity("quantity", quantity)?;
        let current = self.load(resource).await?;
        Ok(current.available() >= quantity && current.expired_on(self.clock.today()).is_none())
    }

    /// Booked fraction of the resource's capacity
    pub async fn utilization(&self, resource: ResourceRef) -> Result<f64, CatalogError> {
        Ok(self.load(resource).await?.utilization())
    }

    pub async fn get(&self, resource: ResourceRef) -> Result<BookableResource, CatalogError> {
        self.load(resource).await
    }

    /// Serializes an administrative write with ledger operations on the same resource
    pub(crate) async fn exclusive<F, Fut, T>(&self, resource: ResourceRef, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.locks.lock(&resource).await;
        f().await
    }

    /// Caller holds the resource lock
    async fn deduct(&self, resource: ResourceRef, quantity: u32) -> Result<BookableResource, CatalogError> {
        let mut current = self.load(resource).await?;
        let available = current.available();
        if available < quantity {
            return Err(CatalogError::InsufficientCapacity {
                resource,
                requested: quantity,
                available,
            });
        }
        if let Some(start_date) = current.expired_on(self.clock.today()) {
            return Err(CatalogError::Expired {
                resource,
                start_date,
            });
        }

        current.set_available(available - quantity, self.clock.now());
        let saved = self.store(&current).await?;
        info!(quantity, available = saved.available(), "Units reserved");
        Ok(saved)
    }

    /// Caller holds the resource lock
    async fn restore(&self, resource: ResourceRef, quantity: u32) -> Result<BookableResource, CatalogError> {
        let mut current = self.load(resource).await?;
        let available = current.available();
        let capacity = current.capacity();
        let restored = available
            .checked_add(quantity)
            .filter(|restored| *restored <= capacity)
            .ok_or(CatalogError::CapacityExceeded {
                resource,
                requested: quantity,
                available,
                capacity,
            })?;

        current.set_available(restored, self.clock.now());
        let saved = self.store(&current).await?;
        info!(quantity, available = saved.available(), "Units released");
        Ok(saved)
    }

    async fn load(&self, resource: ResourceRef) -> Result<BookableResource, CatalogError> {
        self.port
            .get_resource(resource)
            .await
            .map_err(|e| CatalogError::from_resource_lookup(resource, e))
    }

    async fn store(&self, resource: &BookableResource) -> Result<BookableResource, CatalogError> {
        self.port.save_resource(resource).await.map_err(|e| {
            if e.is_conflict() {
                warn!(resource = %resource.resource_ref(), "Concurrent write on resource");
            }
            CatalogError::Port(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockCatalogPort;
    use crate::resource::{Lodge, Tour};
    use chrono::{NaiveDate, Utc};
    use core_kernel::{Classify, Currency, ErrorKind, FixedClock, LodgeId, Money, TourId};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn tour(capacity: u32, available: u32, start_date: NaiveDate) -> Tour {
        Tour {
            id: TourId::new(),
            name: "Skardu Valley".to_string(),
            description: None,
            location_id: None,
            duration_days: 5,
            price: Money::new(dec!(200), Currency::USD),
            capacity,
            available,
            start_date,
            end_date: start_date + chrono::Duration::days(5),
            guide: Some("Karim".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        }
    }

    fn lodge(total: u32, available: u32) -> Lodge {
        Lodge {
            id: LodgeId::new(),
            name: "Serena Inn".to_string(),
            lodge_type: "HOTEL".to_string(),
            address: None,
            contact_number: None,
            location_id: None,
            price_per_night: Money::new(dec!(80), Currency::USD),
            total_rooms: total,
            available_rooms: available,
            amenities: vec![],
            rating: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        }
    }

    async fn ledger_with(resource: BookableResource) -> (InventoryLedger, Arc<MockCatalogPort>) {
        let port = Arc::new(MockCatalogPort::with_resources(vec![resource]).await);
        let clock = Arc::new(FixedClock::at_date(today()));
        (InventoryLedger::new(port.clone(), clock), port)
    }

    #[tokio::test]
    async fn test_reserve_then_release_restores_available() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        assert_eq!(ledger.reserve(r, 4).await.unwrap().available(), 6);
        assert_eq!(ledger.release(r, 4).await.unwrap().available(), 10);
    }

    #[tokio::test]
    async fn test_reserve_rejects_non_positive_quantity() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        for n in [0, -2] {
            let err = ledger.reserve(r, n).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(ledger.get(r).await.unwrap().available(), 10);
    }

    #[tokio::test]
    async fn test_insufficient_capacity_leaves_counter() {
        let t = tour(10, 6, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        let err = ledger.reserve(r, 8).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InsufficientCapacity { requested: 8, available: 6, .. }
        ));
        assert_eq!(ledger.get(r).await.unwrap().available(), 6);
    }

    #[tokio::test]
    async fn test_capacity_is_checked_before_expiry() {
        let t = tour(10, 2, today().pred_opt().unwrap());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        let err = ledger.reserve(r, 5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientCapacity);
        let err = ledger.reserve(r, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_tour_starting_today_is_bookable() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        assert!(ledger.is_available(r, 10).await.unwrap());
        assert!(!ledger.is_available(r, 11).await.unwrap());
    }

    /// Lodges have no departure date, so the expiry policy never applies.
    #[tokio::test]
    async fn test_expiry_applies_to_tours_only() {
        let l = lodge(5, 5);
        let r = ResourceRef::Lodge(l.id);
        let (ledger, _) = ledger_with(l.into()).await;

        assert!(ledger.is_available(r, 5).await.unwrap());
        assert!(ledger.reserve(r, 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_beyond_capacity_is_rejected() {
        let l = lodge(5, 4);
        let r = ResourceRef::Lodge(l.id);
        let (ledger, _) = ledger_with(l.into()).await;

        let err = ledger.release(r, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(ledger.get(r).await.unwrap().available(), 4);
    }

    #[tokio::test]
    async fn test_reclaim_ignores_expiry() {
        let t = tour(10, 10, today().pred_opt().unwrap());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        assert_eq!(ledger.reclaim(r, 3).await.unwrap().available(), 7);
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let (ledger, _) = ledger_with(tour(1, 1, today()).into()).await;
        let err = ledger.reserve(ResourceRef::Tour(TourId::new()), 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_external_write_surfaces_conflict() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, port) = ledger_with(t.clone().into()).await;

        port.touch(r).await;
        let stale: BookableResource = t.into();
        let err = port.save_resource(&stale).await.unwrap_err();
        assert!(err.is_conflict());

        // The ledger always loads fresh state, so it is unaffected
        assert_eq!(ledger.reserve(r, 1).await.unwrap().available(), 9);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_counter() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, port) = ledger_with(t.into()).await;

        port.fail_next_save();
        let err = ledger.reserve(r, 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(ledger.get(r).await.unwrap().available(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_oversell() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;
        let ledger = Arc::new(ledger);

        let mut handles = Vec::new();
        for _ in 0..25 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.reserve(r, 1).await }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientCapacity),
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(ledger.get(r).await.unwrap().available(), 0);
    }

    #[tokio::test]
    async fn test_reserve_with_returns_units_when_record_fails() {
        let t = tour(10, 10, today());
        let r = ResourceRef::Tour(t.id);
        let (ledger, _) = ledger_with(t.into()).await;

        let recorded = ledger
            .reserve_with(r, 3, |reserved| async move {
                Ok::<_, CatalogError>(reserved.available())
            })
            .await
            .unwrap();
        assert_eq!(recorded, 7);

        let err = ledger
            .reserve_with(r, 4, |_| async move {
                Err::<(), _>(CatalogError::Port(core_kernel::PortError::connection("down")))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(ledger.get(r).await.unwrap().available(), 7);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::ports::mock::MockCatalogPort;
    use crate::resource::Transport;
    use chrono::{NaiveDate, Utc};
    use core_kernel::{Currency, FixedClock, Money, TransportId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Clone)]
    enum Op {
        Reserve(i64),
        Release(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-2i64..15).prop_map(Op::Reserve),
            (-2i64..15).prop_map(Op::Release),
        ]
    }

    proptest! {
        #[test]
        fn available_stays_within_bounds(
            capacity in 1u32..40,
            ops in proptest::collection::vec(op(), 1..40)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let transport = Transport {
                    id: TransportId::new(),
                    transport_type: "BUS".to_string(),
                    provider: "Daewoo".to_string(),
                    vehicle_number: None,
                    from_location_id: None,
                    to_location_id: None,
                    cost: Money::new(dec!(15), Currency::USD),
                    capacity,
                    available_seats: capacity,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                    version: 1,
                };
                let resource = ResourceRef::Transport(transport.id);
                let port = Arc::new(MockCatalogPort::with_resources(vec![transport.into()]).await);
                let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
                let ledger = InventoryLedger::new(port, clock);

                // Model of the counter, advanced only by successful operations
                let mut expected = i64::from(capacity);
                for op in ops {
                    match op {
                        Op::Reserve(n) => {
                            if ledger.reserve(resource, n).await.is_ok() {
                                expected -= n;
                            }
                        }
                        Op::Release(n) => {
                            if ledger.release(resource, n).await.is_ok() {
                                expected += n;
                            }
                        }
                    }
                    let available = i64::from(ledger.get(resource).await.unwrap().available());
                    assert_eq!(available, expected);
                    assert!(available >= 0 && available <= i64::from(capacity));
                }
            });
        }
    }
}
