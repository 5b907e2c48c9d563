//! Catalog Domain Ports
//!
//! `CatalogPort` stores locations and the three kinds of bookable resource.
//! Saving an existing resource is a compare-and-set on its `version`; the
//! inventory ledger relies on that to detect writes from other processes.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{DomainPort, HealthCheckable, LocationId, PortError};

use crate::location::Location;
use crate::resource::{BookableResource, ResourceKind, ResourceRef};

/// Filter for resource searches. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    pub kind: Option<ResourceKind>,
    /// Tour or lodge location, or either end of a transport route
    pub location_id: Option<LocationId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring of the name (provider for transports)
    pub name_contains: Option<String>,
    /// Only resources with `available > 0`
    pub available_only: bool,
    pub start_from: Option<NaiveDate>,
    pub start_to: Option<NaiveDate>,
    pub lodge_type: Option<String>,
    pub min_rating: Option<Decimal>,
    pub transport_type: Option<String>,
    pub provider: Option<String>,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
}

impl ResourceQuery {
    pub fn of_kind(kind: ResourceKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn at_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn priced_between(mut self, min: Decimal, max: Decimal) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    pub fn named(mut self, keyword: impl Into<String>) -> Self {
        self.name_contains = Some(keyword.into());
        self
    }

    pub fn available(mut self) -> Self {
        self.available_only = true;
        self
    }

    /// In-memory evaluation of the filter, shared by adapters that cannot
    /// push every predicate down to storage
    pub fn matches(&self, resource: &BookableResource) -> bool {
        if let Some(kind) = self.kind {
            if resource.kind() != kind {
                return false;
            }
        }
        if let Some(location_id) = self.location_id {
            if !resource.location_ids().contains(&location_id) {
                return false;
            }
        }
        let price = resource.unit_price().amount();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        if let Some(ref keyword) = self.name_contains {
            if !contains_ignore_case(resource.name(), keyword) {
                return false;
            }
        }
        if self.available_only && resource.available() == 0 {
            return false;
        }

        match resource {
            BookableResource::Tour(tour) => {
                if self.start_from.is_some_and(|from| tour.start_date < from) {
                    return false;
                }
                if self.start_to.is_some_and(|to| tour.start_date > to) {
                    return false;
                }
            }
            BookableResource::Lodge(lodge) => {
                if let Some(ref lodge_type) = self.lodge_type {
                    if !lodge.lodge_type.eq_ignore_ascii_case(lodge_type) {
                        return false;
                    }
                }
                if let Some(min_rating) = self.min_rating {
                    if lodge.rating.map_or(true, |r| r < min_rating) {
                        return false;
                    }
                }
            }
            BookableResource::Transport(transport) => {
                if let Some(ref transport_type) = self.transport_type {
                    if !transport.transport_type.eq_ignore_ascii_case(transport_type) {
                        return false;
                    }
                }
                if let Some(ref provider) = self.provider {
                    if !transport.provider.eq_ignore_ascii_case(provider) {
                        return false;
                    }
                }
                if self.from_location_id.is_some() && transport.from_location_id != self.from_location_id {
                    return false;
                }
                if self.to_location_id.is_some() && transport.to_location_id != self.to_location_id {
                    return false;
                }
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
pub trait CatalogPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Locations
    // ========================================================================

    async fn get_location(&self, id: LocationId) -> Result<Location, PortError>;

    async fn list_locations(&self) -> Result<Vec<Location>, PortError>;

    async fn find_locations_by_country(&self, country: &str) -> Result<Vec<Location>, PortError>;

    /// Case-insensitive substring match on the name
    async fn search_locations(&self, keyword: &str) -> Result<Vec<Location>, PortError>;

    async fn location_exists(&self, id: LocationId) -> Result<bool, PortError>;

    async fn insert_location(&self, location: &Location) -> Result<Location, PortError>;

    /// Compare-and-set on `location.version`
    async fn update_location(&self, location: &Location) -> Result<Location, PortError>;

    async fn delete_location(&self, id: LocationId) -> Result<(), PortError>;

    // ========================================================================
    // Bookable resources
    // ========================================================================

    async fn get_resource(&self, resource: ResourceRef) -> Result<BookableResource, PortError>;

    async fn find_resources(&self, query: &ResourceQuery) -> Result<Vec<BookableResource>, PortError>;

    async fn resource_exists(&self, resource: ResourceRef) -> Result<bool, PortError>;

    async fn insert_resource(&self, resource: &BookableResource) -> Result<BookableResource, PortError>;

    /// Compare-and-set on `resource.version()`; returns the stored copy with
    /// the bumped version, or `PortError::Conflict` if the stored version differs
    async fn save_resource(&self, resource: &BookableResource) -> Result<BookableResource, PortError>;

    async fn delete_resource(&self, resource: ResourceRef) -> Result<(), PortError>;
}

/// Answers whether live bookings still hold units of a resource.
///
/// Implemented by the booking side; the catalog consults it before deleting
/// a resource so a PENDING or CONFIRMED booking never outlives its resource.
#[async_trait]
pub trait ActiveReservations: Send + Sync {
    async fn has_active(&self, resource: ResourceRef) -> Result<bool, PortError>;
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory mock implementation of CatalogPort
    #[derive(Debug, Default)]
    pub struct MockCatalogPort {
        locations: Arc<RwLock<HashMap<LocationId, Location>>>,
        resources: Arc<RwLock<HashMap<ResourceRef, BookableResource>>>,
        fail_next_save: AtomicBool,
    }

    impl MockCatalogPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with resources for testing
        pub async fn with_resources(resources: Vec<BookableResource>) -> Self {
            let port = Self::new();
            for resource in resources {
                port.resources
                    .write()
                    .await
                    .insert(resource.resource_ref(), resource);
            }
            port
        }

        /// The next insert or save fails with a connection error
        pub fn fail_next_save(&self) {
            self.fail_next_save.store(true, Ordering::SeqCst);
        }

        /// Simulates a write by another process: bumps the stored version
        pub async fn touch(&self, resource: ResourceRef) {
            if let Some(stored) = self.resources.write().await.get_mut(&resource) {
                let next = stored.version() + 1;
                stored.set_version(next);
            }
        }

        fn injected_failure(&self) -> Result<(), PortError> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(PortError::connection("injected save failure"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockCatalogPort {}

    /// Reservation index with explicitly held resources
    #[derive(Debug, Default)]
    pub struct MockReservations {
        held: RwLock<std::collections::HashSet<ResourceRef>>,
    }

    impl MockReservations {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn hold(&self, resource: ResourceRef) {
            self.held.write().await.insert(resource);
        }
    }

    #[async_trait]
    impl ActiveReservations for MockReservations {
        async fn has_active(&self, resource: ResourceRef) -> Result<bool, PortError> {
            Ok(self.held.read().await.contains(&resource))
        }
    }

    #[async_trait]
    impl HealthCheckable for MockCatalogPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-catalog-port", 0)
        }
    }

    #[async_trait]
    impl CatalogPort for MockCatalogPort {
        async fn get_location(&self, id: LocationId) -> Result<Location, PortError> {
            self.locations
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Location", id))
        }

        async fn list_locations(&self) -> Result<Vec<Location>, PortError> {
            let mut locations: Vec<_> = self.locations.read().await.values().cloned().collect();
            locations.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(locations)
        }

        async fn find_locations_by_country(&self, country: &str) -> Result<Vec<Location>, PortError> {
            Ok(self
                .list_locations()
                .await?
                .into_iter()
                .filter(|l| l.country.eq_ignore_ascii_case(country))
                .collect())
        }

        async fn search_locations(&self, keyword: &str) -> Result<Vec<Location>, PortError> {
            Ok(self
                .list_locations()
                .await?
                .into_iter()
                .filter(|l| contains_ignore_case(&l.name, keyword))
                .collect())
        }

        async fn location_exists(&self, id: LocationId) -> Result<bool, PortError> {
            Ok(self.locations.read().await.contains_key(&id))
        }

        async fn insert_location(&self, location: &Location) -> Result<Location, PortError> {
            self.injected_failure()?;
            self.locations
                .write()
                .await
                .insert(location.id, location.clone());
            Ok(location.clone())
        }

        async fn update_location(&self, location: &Location) -> Result<Location, PortError> {
            self.injected_failure()?;
            let mut locations = self.locations.write().await;
            let stored = locations
                .get(&location.id)
                .ok_or_else(|| PortError::not_found("Location", location.id))?;
            if stored.version != location.version {
                return Err(PortError::conflict("Location", location.id, location.version));
            }
            let mut saved = location.clone();
            saved.version += 1;
            locations.insert(saved.id, saved.clone());
            Ok(saved)
        }

        async fn delete_location(&self, id: LocationId) -> Result<(), PortError> {
            self.locations
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Location", id))
        }

        async fn get_resource(&self, resource: ResourceRef) -> Result<BookableResource, PortError> {
            self.resources
                .read()
                .await
                .get(&resource)
                .cloned()
                .ok_or_else(|| PortError::not_found(resource.kind().as_str(), resource))
        }

        async fn find_resources(&self, query: &ResourceQuery) -> Result<Vec<BookableResource>, PortError> {
            let mut found: Vec<_> = self
                .resources
                .read()
                .await
                .values()
                .filter(|r| query.matches(r))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.name().cmp(b.name()));
            Ok(found)
        }

        async fn resource_exists(&self, resource: ResourceRef) -> Result<bool, PortError> {
            Ok(self.resources.read().await.contains_key(&resource))
        }

        async fn insert_resource(&self, resource: &BookableResource) -> Result<BookableResource, PortError> {
            self.injected_failure()?;
            let mut resources = self.resources.write().await;
            if resources.contains_key(&resource.resource_ref()) {
                return Err(PortError::duplicate(format!("resource {}", resource.resource_ref())));
            }
            resources.insert(resource.resource_ref(), resource.clone());
            Ok(resource.clone())
        }

        async fn save_resource(&self, resource: &BookableResource) -> Result<BookableResource, PortError> {
            self.injected_failure()?;
            let key = resource.resource_ref();
            let mut resources = self.resources.write().await;
            let stored = resources
                .get(&key)
                .ok_or_else(|| PortError::not_found(key.kind().as_str(), key))?;
            if stored.version() != resource.version() {
                return Err(PortError::conflict(key.kind().as_str(), key, resource.version()));
            }
            let mut saved = resource.clone();
            saved.set_version(resource.version() + 1);
            resources.insert(key, saved.clone());
            Ok(saved)
        }

        async fn delete_resource(&self, resource: ResourceRef) -> Result<(), PortError> {
            self.resources
                .write()
                .await
                .remove(&resource)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found(resource.kind().as_str(), resource))
        }
    }
}
