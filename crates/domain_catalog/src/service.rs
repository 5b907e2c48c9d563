//! Catalog administration and search
//!
//! Creates, replaces and deletes locations and resources, and answers the
//! browse queries. Writes to an existing resource take the same per-resource
//! lock as the inventory ledger so an admin edit never interleaves with a
//! reservation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::{
    validation, Clock, Currency, LocationId, LodgeId, Money, TourId, TransportId,
    ValidationError,
};

use crate::draft::{LodgeDraft, TourDraft, TransportDraft};
use crate::error::CatalogError;
use crate::inventory::InventoryLedger;
use crate::location::{Location, LocationDraft};
use crate::ports::{ActiveReservations, CatalogPort, ResourceQuery};
use crate::resource::{BookableResource, Lodge, ResourceKind, ResourceRef, Tour, Transport};

/// Lodges rated at or above this are "top rated"
pub const TOP_RATED_THRESHOLD: Decimal = dec!(4);

pub struct CatalogService {
    port: Arc<dyn CatalogPort>,
    ledger: Arc<InventoryLedger>,
    reservations: Arc<dyn ActiveReservations>,
    clock: Arc<dyn Clock>,
    currency: Currency,
}

impl CatalogService {
    pub fn new(
        port: Arc<dyn CatalogPort>,
        ledger: Arc<InventoryLedger>,
        reservations: Arc<dyn ActiveReservations>,
        clock: Arc<dyn Clock>,
        currency: Currency,
    ) -> Self {
        Self {
            port,
            ledger,
            reservations,
            clock,
            currency,
        }
    }

    // ========================================================================
    // Locations
    // ========================================================================

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_location(&self, draft: LocationDraft) -> Result<Location, CatalogError> {
        let now = self.clock.now();
        let mut location = Location {
            id: LocationId::new_v7(),
            name: String::new(),
            country: String::new(),
            state: None,
            city: None,
            description: None,
            climate: None,
            best_time_to_visit: None,
            popular_attractions: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        };
        apply_location_draft(&mut location, draft)?;

        let location = self.port.insert_location(&location).await?;
        info!(location_id = %location.id, "Location created");
        Ok(location)
    }

    pub async fn get_location(&self, id: LocationId) -> Result<Location, CatalogError> {
        self.port
            .get_location(id)
            .await
            .map_err(|e| CatalogError::from_location_lookup(id, e))
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, CatalogError> {
        Ok(self.port.list_locations().await?)
    }

    pub async fn list_locations_by_country(&self, country: &str) -> Result<Vec<Location>, CatalogError> {
        let country = validation::non_blank("country", country)?;
        Ok(self.port.find_locations_by_country(&country).await?)
    }

    pub async fn search_locations(&self, keyword: &str) -> Result<Vec<Location>, CatalogError> {
        let keyword = validation::non_blank("keyword", keyword)?;
        Ok(self.port.search_locations(&keyword).await?)
    }

    #[instrument(skip(self, draft), fields(location_id = %id))]
    pub async fn update_location(
        &self,
        id: LocationId,
        draft: LocationDraft,
    ) -> Result<Location, CatalogError> {
        let mut location = self.get_location(id).await?;
        apply_location_draft(&mut location, draft)?;
        location.updated_at = self.clock.now();

        let location = self.port.update_location(&location).await?;
        info!(version = location.version, "Location updated");
        Ok(location)
    }

    #[instrument(skip(self), fields(location_id = %id))]
    pub async fn delete_location(&self, id: LocationId) -> Result<(), CatalogError> {
        self.port
            .delete_location(id)
            .await
            .map_err(|e| CatalogError::from_location_lookup(id, e))?;
        info!("Location deleted");
        Ok(())
    }

    // ========================================================================
    // Resource administration
    // ========================================================================

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_tour(&self, draft: TourDraft) -> Result<Tour, CatalogError> {
        let now = self.clock.now();
        let tour = self.build_tour(TourId::new_v7(), draft, None, now, now, 1).await?;
        let saved = self.insert(tour.into()).await?;
        into_kind(saved, BookableResource::into_tour)
    }

    #[instrument(skip(self, draft), fields(tour_id = %id))]
    pub async fn update_tour(&self, id: TourId, draft: TourDraft) -> Result<Tour, CatalogError> {
        let resource = ResourceRef::Tour(id);
        self.ledger
            .exclusive(resource, move || async move {
                let current = self.get_tour(id).await?;
                let tour = self
                    .build_tour(
                        id,
                        draft,
                        Some(current.available),
                        current.created_at,
                        self.clock.now(),
                        current.version,
                    )
                    .await?;
                let saved = self.save(tour.into()).await?;
                into_kind(saved, BookableResource::into_tour)
            })
            .await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_lodge(&self, draft: LodgeDraft) -> Result<Lodge, CatalogError> {
        let now = self.clock.now();
        let lodge = self.build_lodge(LodgeId::new_v7(), draft, None, now, now, 1).await?;
        let saved = self.insert(lodge.into()).await?;
        into_kind(saved, BookableResource::into_lodge)
    }

    #[instrument(skip(self, draft), fields(lodge_id = %id))]
    pub async fn update_lodge(&self, id: LodgeId, draft: LodgeDraft) -> Result<Lodge, CatalogError> {
        let resource = ResourceRef::Lodge(id);
        self.ledger
            .exclusive(resource, move || async move {
                let current = self.get_lodge(id).await?;
                let lodge = self
                    .build_lodge(
                        id,
                        draft,
                        Some(current.available_rooms),
                        current.created_at,
                        self.clock.now(),
                        current.version,
                    )
                    .await?;
                let saved = self.save(lodge.into()).await?;
                into_kind(saved, BookableResource::into_lodge)
            })
            .await
    }

    #[instrument(skip(self, draft), fields(provider = %draft.provider))]
    pub async fn create_transport(&self, draft: TransportDraft) -> Result<Transport, CatalogError> {
        let now = self.clock.now();
        let transport = self
            .build_transport(TransportId::new_v7(), draft, None, now, now, 1)
            .await?;
        let saved = self.insert(transport.into()).await?;
        into_kind(saved, BookableResource::into_transport)
    }

    #[instrument(skip(self, draft), fields(transport_id = %id))]
    pub async fn update_transport(
        &self,
        id: TransportId,
        draft: TransportDraft,
    ) -> Result<Transport, CatalogError> {
        let resource = ResourceRef::Transport(id);
        self.ledger
            .exclusive(resource, move || async move {
                let current = self.get_transport(id).await?;
                let transport = self
                    .build_transport(
                        id,
                        draft,
                        Some(current.available_seats),
                        current.created_at,
                        self.clock.now(),
                        current.version,
                    )
                    .await?;
                let saved = self.save(transport.into()).await?;
                into_kind(saved, BookableResource::into_transport)
            })
            .await
    }

    /// Deletes a resource that no PENDING or CONFIRMED booking holds.
    ///
    /// Runs under the resource lock, which booking creation also holds until
    /// its record is stored, so a booking cannot appear between the check and
    /// the delete.
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn delete_resource(&self, resource: ResourceRef) -> Result<(), CatalogError> {
        self.ledger
            .exclusive(resource, move || async move {
                self.ledger.get(resource).await?;
                if self.reservations.has_active(resource).await? {
                    return Err(CatalogError::ResourceInUse { resource });
                }
                self.port
                    .delete_resource(resource)
                    .await
                    .map_err(|e| CatalogError::from_resource_lookup(resource, e))
            })
            .await?;
        info!("Resource deleted");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_resource(&self, resource: ResourceRef) -> Result<BookableResource, CatalogError> {
        self.ledger.get(resource).await
    }

    pub async fn get_tour(&self, id: TourId) -> Result<Tour, CatalogError> {
        into_kind(self.get_resource(id.into()).await?, BookableResource::into_tour)
    }

    pub async fn get_lodge(&self, id: LodgeId) -> Result<Lodge, CatalogError> {
        into_kind(self.get_resource(id.into()).await?, BookableResource::into_lodge)
    }

    pub async fn get_transport(&self, id: TransportId) -> Result<Transport, CatalogError> {
        into_kind(self.get_resource(id.into()).await?, BookableResource::into_transport)
    }

    /// Runs an arbitrary filter
    pub async fn find(&self, query: &ResourceQuery) -> Result<Vec<BookableResource>, CatalogError> {
        Ok(self.port.find_resources(query).await?)
    }

    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<BookableResource>, CatalogError> {
        self.find(&ResourceQuery::of_kind(kind)).await
    }

    pub async fn list_by_location(
        &self,
        kind: ResourceKind,
        location_id: LocationId,
    ) -> Result<Vec<BookableResource>, CatalogError> {
        self.find(&ResourceQuery::of_kind(kind).at_location(location_id))
            .await
    }

    /// Resources with at least one unit left
    pub async fn list_available(&self, kind: ResourceKind) -> Result<Vec<BookableResource>, CatalogError> {
        self.find(&ResourceQuery::of_kind(kind).available()).await
    }

    pub async fn list_by_price_range(
        &self,
        kind: ResourceKind,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<BookableResource>, CatalogError> {
        validation::price_range("price", min, max)?;
        self.find(&ResourceQuery::of_kind(kind).priced_between(min, max))
            .await
    }

    pub async fn search_by_name(
        &self,
        kind: ResourceKind,
        keyword: &str,
    ) -> Result<Vec<BookableResource>, CatalogError> {
        let keyword = validation::non_blank("keyword", keyword)?;
        self.find(&ResourceQuery::of_kind(kind).named(keyword)).await
    }

    /// Tours departing between `start` and `end` inclusive
    pub async fn tours_starting_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Tour>, CatalogError> {
        validation::ordered("start_date", &start, &end)?;
        let query = ResourceQuery {
            start_from: Some(start),
            start_to: Some(end),
            ..ResourceQuery::of_kind(ResourceKind::Tour)
        };
        Ok(self
            .find(&query)
            .await?
            .into_iter()
            .filter_map(BookableResource::into_tour)
            .collect())
    }

    pub async fn lodges_by_type(&self, lodge_type: &str) -> Result<Vec<Lodge>, CatalogError> {
        let lodge_type = validation::non_blank("lodge_type", lodge_type)?;
        let query = ResourceQuery {
            lodge_type: Some(lodge_type),
            ..ResourceQuery::of_kind(ResourceKind::Lodge)
        };
        self.find_lodges(&query).await
    }

    pub async fn lodges_with_min_rating(&self, min_rating: Decimal) -> Result<Vec<Lodge>, CatalogError> {
        validation::within("rating", min_rating, dec!(0), dec!(5))?;
        let query = ResourceQuery {
            min_rating: Some(min_rating),
            ..ResourceQuery::of_kind(ResourceKind::Lodge)
        };
        self.find_lodges(&query).await
    }

    /// Lodges rated 4 or higher, best first
    pub async fn top_rated_lodges(&self) -> Result<Vec<Lodge>, CatalogError> {
        let mut lodges = self.lodges_with_min_rating(TOP_RATED_THRESHOLD).await?;
        lodges.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(lodges)
    }

    /// Mean nightly price of the lodges at a location; zero when there are none
    pub async fn average_lodge_price(&self, location_id: LocationId) -> Result<Money, CatalogError> {
        self.require_location(location_id).await?;
        let query = ResourceQuery::of_kind(ResourceKind::Lodge).at_location(location_id);
        let lodges = self.find_lodges(&query).await?;
        if lodges.is_empty() {
            return Ok(Money::zero(self.currency));
        }
        let total = Money::sum(self.currency, lodges.iter().map(|l| &l.price_per_night))?;
        let count = Decimal::from(lodges.len() as u64);
        Ok(Money::new(total.amount() / count, self.currency))
    }

    pub async fn transports_by_type(&self, transport_type: &str) -> Result<Vec<Transport>, CatalogError> {
        let transport_type = validation::non_blank("transport_type", transport_type)?;
        let query = ResourceQuery {
            transport_type: Some(transport_type),
            ..ResourceQuery::of_kind(ResourceKind::Transport)
        };
        self.find_transports(&query).await
    }

    pub async fn transports_by_provider(&self, provider: &str) -> Result<Vec<Transport>, CatalogError> {
        let provider = validation::non_blank("provider", provider)?;
        let query = ResourceQuery {
            provider: Some(provider),
            ..ResourceQuery::of_kind(ResourceKind::Transport)
        };
        self.find_transports(&query).await
    }

    /// Transports running from one location to another; both must exist
    pub async fn transports_on_route(
        &self,
        from: LocationId,
        to: LocationId,
    ) -> Result<Vec<Transport>, CatalogError> {
        self.require_location(from).await?;
        self.require_location(to).await?;
        let query = ResourceQuery {
            from_location_id: Some(from),
            to_location_id: Some(to),
            ..ResourceQuery::of_kind(ResourceKind::Transport)
        };
        self.find_transports(&query).await
    }

    pub async fn transports_from(&self, from: LocationId) -> Result<Vec<Transport>, CatalogError> {
        let query = ResourceQuery {
            from_location_id: Some(from),
            ..ResourceQuery::of_kind(ResourceKind::Transport)
        };
        self.find_transports(&query).await
    }

    pub async fn transports_to(&self, to: LocationId) -> Result<Vec<Transport>, CatalogError> {
        let query = ResourceQuery {
            to_location_id: Some(to),
            ..ResourceQuery::of_kind(ResourceKind::Transport)
        };
        self.find_transports(&query).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn find_lodges(&self, query: &ResourceQuery) -> Result<Vec<Lodge>, CatalogError> {
        Ok(self
            .find(query)
            .await?
            .into_iter()
            .filter_map(BookableResource::into_lodge)
            .collect())
    }

    async fn find_transports(&self, query: &ResourceQuery) -> Result<Vec<Transport>, CatalogError> {
        Ok(self
            .find(query)
            .await?
            .into_iter()
            .filter_map(BookableResource::into_transport)
            .collect())
    }

    async fn require_location(&self, id: LocationId) -> Result<(), CatalogError> {
        if !self.port.location_exists(id).await? {
            return Err(CatalogError::LocationNotFound(id));
        }
        Ok(())
    }

    async fn require_optional_location(&self, id: Option<LocationId>) -> Result<(), CatalogError> {
        match id {
            Some(id) => self.require_location(id).await,
            None => Ok(()),
        }
    }

    async fn insert(&self, resource: BookableResource) -> Result<BookableResource, CatalogError> {
        let saved = self.port.insert_resource(&resource).await?;
        info!(
            resource = %saved.resource_ref(),
            capacity = saved.capacity(),
            available = saved.available(),
            "Resource created"
        );
        Ok(saved)
    }

    async fn save(&self, resource: BookableResource) -> Result<BookableResource, CatalogError> {
        let saved = self.port.save_resource(&resource).await?;
        info!(
            resource = %saved.resource_ref(),
            capacity = saved.capacity(),
            available = saved.available(),
            version = saved.version(),
            "Resource updated"
        );
        Ok(saved)
    }

    async fn build_tour(
        &self,
        id: TourId,
        draft: TourDraft,
        current_available: Option<u32>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: i64,
    ) -> Result<Tour, CatalogError> {
        let name = validation::non_blank("name", &draft.name)?;
        let duration_days = validation::positive_quantity("duration_days", draft.duration_days)?;
        validation::non_negative_money("price", &draft.price)?;
        let (capacity, available) =
            counters("capacity", draft.capacity, draft.available, current_available)?;
        validation::ordered("start_date", &draft.start_date, &draft.end_date)?;
        self.require_optional_location(draft.location_id).await?;

        Ok(Tour {
            id,
            name,
            description: draft.description,
            location_id: draft.location_id,
            duration_days,
            price: draft.price,
            capacity,
            available,
            start_date: draft.start_date,
            end_date: draft.end_date,
            guide: draft.guide,
            created_at,
            updated_at,
            version,
        })
    }

    async fn build_lodge(
        &self,
        id: LodgeId,
        draft: LodgeDraft,
        current_available: Option<u32>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: i64,
    ) -> Result<Lodge, CatalogError> {
        let name = validation::non_blank("name", &draft.name)?;
        let lodge_type = validation::non_blank("lodge_type", &draft.lodge_type)?;
        validation::non_negative_money("price_per_night", &draft.price_per_night)?;
        let (total_rooms, available_rooms) = counters(
            "total_rooms",
            draft.total_rooms,
            draft.available_rooms,
            current_available,
        )?;
        if let Some(rating) = draft.rating {
            validation::within("rating", rating, dec!(0), dec!(5))?;
        }
        self.require_optional_location(draft.location_id).await?;

        Ok(Lodge {
            id,
            name,
            lodge_type: lodge_type.to_ascii_uppercase(),
            address: draft.address,
            contact_number: draft.contact_number,
            location_id: draft.location_id,
            price_per_night: draft.price_per_night,
            total_rooms,
            available_rooms,
            amenities: draft.amenities,
            rating: draft.rating,
            created_at,
            updated_at,
            version,
        })
    }

    async fn build_transport(
        &self,
        id: TransportId,
        draft: TransportDraft,
        current_available: Option<u32>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: i64,
    ) -> Result<Transport, CatalogError> {
        let transport_type = validation::non_blank("transport_type", &draft.transport_type)?;
        let provider = validation::non_blank("provider", &draft.provider)?;
        validation::non_negative_money("cost", &draft.cost)?;
        let (capacity, available_seats) = counters(
            "capacity",
            draft.capacity,
            draft.available_seats,
            current_available,
        )?;
        self.require_optional_location(draft.from_location_id).await?;
        self.require_optional_location(draft.to_location_id).await?;

        Ok(Transport {
            id,
            transport_type: transport_type.to_ascii_uppercase(),
            provider,
            vehicle_number: draft.vehicle_number,
            from_location_id: draft.from_location_id,
            to_location_id: draft.to_location_id,
            cost: draft.cost,
            capacity,
            available_seats,
            created_at,
            updated_at,
            version,
        })
    }
}

/// Validates a capacity and its remaining-units counter.
///
/// An explicit `available` wins; otherwise the current value is kept on
/// update and the full capacity is used on create.
fn counters(
    capacity_field: &str,
    capacity: i64,
    available: Option<i64>,
    current_available: Option<u32>,
) -> Result<(u32, u32), ValidationError> {
    let capacity = validation::positive_quantity(capacity_field, capacity)?;
    let available = match (available, current_available) {
        (Some(explicit), _) => validation::non_negative_count("available", explicit)?,
        (None, Some(current)) => current,
        (None, None) => capacity,
    };
    validation::available_within_capacity(available, capacity)?;
    Ok((capacity, available))
}

fn apply_location_draft(location: &mut Location, draft: LocationDraft) -> Result<(), ValidationError> {
    location.name = validation::non_blank("name", &draft.name)?;
    location.country = validation::non_blank("country", &draft.country)?;
    location.state = draft.state;
    location.city = draft.city;
    location.description = draft.description;
    location.climate = draft.climate;
    location.best_time_to_visit = draft.best_time_to_visit;
    location.popular_attractions = draft.popular_attractions;
    Ok(())
}

fn into_kind<T>(
    resource: BookableResource,
    project: fn(BookableResource) -> Option<T>,
) -> Result<T, CatalogError> {
    let reference = resource.resource_ref();
    project(resource).ok_or(CatalogError::ResourceNotFound(reference))
}
