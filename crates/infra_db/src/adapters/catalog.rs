//! PostgreSQL Catalog Adapter
//!
//! Locations live in `locations`; each resource kind has its own table.
//! Resource saves are a compare-and-set on `version`, which is what lets
//! the inventory ledger run safely across several server processes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, LocationId, LodgeId, PortError, TourId,
    TransportId,
};
use domain_catalog::{
    BookableResource, CatalogPort, Location, Lodge, ResourceKind, ResourceQuery, ResourceRef,
    Tour, Transport,
};

use super::{count, money, ping, stale_or_missing};
use crate::error::db_to_port_error;

const LOCATION_COLUMNS: &str = "id, name, country, state, city, description, climate, \
    best_time_to_visit, popular_attractions, created_at, updated_at, version";

const TOUR_COLUMNS: &str = "id, name, description, location_id, duration_days, price, currency, \
    capacity, available, start_date, end_date, guide, created_at, updated_at, version";

const LODGE_COLUMNS: &str = "id, name, lodge_type, address, contact_number, location_id, \
    price_per_night, currency, total_rooms, available_rooms, amenities, rating, \
    created_at, updated_at, version";

const TRANSPORT_COLUMNS: &str = "id, transport_type, provider, vehicle_number, from_location_id, \
    to_location_id, cost, currency, capacity, available_seats, created_at, updated_at, version";

/// Where each resource kind is stored and which columns play which role
struct Table {
    name: &'static str,
    columns: &'static str,
    name_column: &'static str,
    price_column: &'static str,
    available_column: &'static str,
    entity: &'static str,
}

impl Table {
    fn of(kind: ResourceKind) -> &'static Table {
        match kind {
            ResourceKind::Tour => &TOURS,
            ResourceKind::Lodge => &LODGES,
            ResourceKind::Transport => &TRANSPORTS,
        }
    }
}

static TOURS: Table = Table {
    name: "tours",
    columns: TOUR_COLUMNS,
    name_column: "name",
    price_column: "price",
    available_column: "available",
    entity: "Tour",
};

static LODGES: Table = Table {
    name: "lodges",
    columns: LODGE_COLUMNS,
    name_column: "name",
    price_column: "price_per_night",
    available_column: "available_rooms",
    entity: "Lodge",
};

static TRANSPORTS: Table = Table {
    name: "transports",
    columns: TRANSPORT_COLUMNS,
    name_column: "provider",
    price_column: "cost",
    available_column: "available_seats",
    entity: "Transport",
};

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    country: String,
    state: Option<String>,
    city: Option<String>,
    description: Option<String>,
    climate: Option<String>,
    best_time_to_visit: Option<String>,
    popular_attractions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: LocationId::from(row.id),
            name: row.name,
            country: row.country,
            state: row.state,
            city: row.city,
            description: row.description,
            climate: row.climate,
            best_time_to_visit: row.best_time_to_visit,
            popular_attractions: row.popular_attractions,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TourRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    location_id: Option<Uuid>,
    duration_days: i64,
    price: Decimal,
    currency: String,
    capacity: i64,
    available: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    guide: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<TourRow> for Tour {
    type Error = PortError;

    fn try_from(row: TourRow) -> Result<Self, Self::Error> {
        Ok(Tour {
            id: TourId::from(row.id),
            name: row.name,
            description: row.description,
            location_id: row.location_id.map(LocationId::from),
            duration_days: count("duration_days", row.duration_days)?,
            price: money(row.price, &row.currency)?,
            capacity: count("capacity", row.capacity)?,
            available: count("available", row.available)?,
            start_date: row.start_date,
            end_date: row.end_date,
            guide: row.guide,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LodgeRow {
    id: Uuid,
    name: String,
    lodge_type: String,
    address: Option<String>,
    contact_number: Option<String>,
    location_id: Option<Uuid>,
    price_per_night: Decimal,
    currency: String,
    total_rooms: i64,
    available_rooms: i64,
    amenities: Vec<String>,
    rating: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<LodgeRow> for Lodge {
    type Error = PortError;

    fn try_from(row: LodgeRow) -> Result<Self, Self::Error> {
        Ok(Lodge {
            id: LodgeId::from(row.id),
            name: row.name,
            lodge_type: row.lodge_type,
            address: row.address,
            contact_number: row.contact_number,
            location_id: row.location_id.map(LocationId::from),
            price_per_night: money(row.price_per_night, &row.currency)?,
            total_rooms: count("total_rooms", row.total_rooms)?,
            available_rooms: count("available_rooms", row.available_rooms)?,
            amenities: row.amenities,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransportRow {
    id: Uuid,
    transport_type: String,
    provider: String,
    vehicle_number: Option<String>,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
    cost: Decimal,
    currency: String,
    capacity: i64,
    available_seats: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<TransportRow> for Transport {
    type Error = PortError;

    fn try_from(row: TransportRow) -> Result<Self, Self::Error> {
        Ok(Transport {
            id: TransportId::from(row.id),
            transport_type: row.transport_type,
            provider: row.provider,
            vehicle_number: row.vehicle_number,
            from_location_id: row.from_location_id.map(LocationId::from),
            to_location_id: row.to_location_id.map(LocationId::from),
            cost: money(row.cost, &row.currency)?,
            capacity: count("capacity", row.capacity)?,
            available_seats: count("available_seats", row.available_seats)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn convert<R, T>(rows: Vec<R>) -> Result<Vec<BookableResource>, PortError>
where
    T: TryFrom<R, Error = PortError> + Into<BookableResource>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map(Into::into))
        .collect()
}

// ============================================================================
// Adapter
// ============================================================================

/// PostgreSQL-backed implementation of [`CatalogPort`]
#[derive(Debug, Clone)]
pub struct PostgresCatalogAdapter {
    pool: PgPool,
}

impl PostgresCatalogAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One kind's candidates with the filter pushed down to SQL
    async fn search(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<Vec<BookableResource>, PortError> {
        let table = Table::of(kind);
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM {} WHERE TRUE", table.columns, table.name));

        if let Some(location_id) = query.location_id {
            let id = *location_id.as_uuid();
            if kind == ResourceKind::Transport {
                builder
                    .push(" AND (from_location_id = ")
                    .push_bind(id)
                    .push(" OR to_location_id = ")
                    .push_bind(id)
                    .push(")");
            } else {
                builder.push(" AND location_id = ").push_bind(id);
            }
        }
        if let Some(min) = query.min_price {
            builder.push(format!(" AND {} >= ", table.price_column)).push_bind(min);
        }
        if let Some(max) = query.max_price {
            builder.push(format!(" AND {} <= ", table.price_column)).push_bind(max);
        }
        if let Some(ref keyword) = query.name_contains {
            builder
                .push(format!(" AND {} ILIKE ", table.name_column))
                .push_bind(format!("%{}%", keyword));
        }
        if query.available_only {
            builder.push(format!(" AND {} > 0", table.available_column));
        }

        match kind {
            ResourceKind::Tour => {
                if let Some(from) = query.start_from {
                    builder.push(" AND start_date >= ").push_bind(from);
                }
                if let Some(to) = query.start_to {
                    builder.push(" AND start_date <= ").push_bind(to);
                }
            }
            ResourceKind::Lodge => {
                if let Some(ref lodge_type) = query.lodge_type {
                    builder.push(" AND upper(lodge_type) = upper(").push_bind(lodge_type.clone()).push(")");
                }
                if let Some(min_rating) = query.min_rating {
                    builder.push(" AND rating >= ").push_bind(min_rating);
                }
            }
            ResourceKind::Transport => {
                if let Some(ref transport_type) = query.transport_type {
                    builder
                        .push(" AND upper(transport_type) = upper(")
                        .push_bind(transport_type.clone())
                        .push(")");
                }
                if let Some(ref provider) = query.provider {
                    builder.push(" AND lower(provider) = lower(").push_bind(provider.clone()).push(")");
                }
                if let Some(from) = query.from_location_id {
                    builder.push(" AND from_location_id = ").push_bind(*from.as_uuid());
                }
                if let Some(to) = query.to_location_id {
                    builder.push(" AND to_location_id = ").push_bind(*to.as_uuid());
                }
            }
        }
        builder.push(format!(" ORDER BY {}, id", table.name_column));

        match kind {
            ResourceKind::Tour => convert::<_, Tour>(
                builder.build_query_as::<TourRow>().fetch_all(&self.pool).await.map_err(db_to_port_error)?,
            ),
            ResourceKind::Lodge => convert::<_, Lodge>(
                builder.build_query_as::<LodgeRow>().fetch_all(&self.pool).await.map_err(db_to_port_error)?,
            ),
            ResourceKind::Transport => convert::<_, Transport>(
                builder
                    .build_query_as::<TransportRow>()
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db_to_port_error)?,
            ),
        }
    }

    async fn find_locations(&self, clause: &str, bind: &str) -> Result<Vec<Location>, PortError> {
        let sql = format!("SELECT {} FROM locations WHERE {} ORDER BY name, id", LOCATION_COLUMNS, clause);
        let rows = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn insert_tour(&self, tour: &Tour) -> Result<BookableResource, PortError> {
        let sql = format!(
            "INSERT INTO tours ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {}",
            TOUR_COLUMNS, TOUR_COLUMNS
        );
        let row = sqlx::query_as::<_, TourRow>(&sql)
            .bind(*tour.id.as_uuid())
            .bind(&tour.name)
            .bind(&tour.description)
            .bind(tour.location_id.map(Uuid::from))
            .bind(i64::from(tour.duration_days))
            .bind(tour.price.amount())
            .bind(tour.price.currency().code())
            .bind(i64::from(tour.capacity))
            .bind(i64::from(tour.available))
            .bind(tour.start_date)
            .bind(tour.end_date)
            .bind(&tour.guide)
            .bind(tour.created_at)
            .bind(tour.updated_at)
            .bind(tour.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        Ok(Tour::try_from(row)?.into())
    }

    async fn update_tour(&self, tour: &Tour) -> Result<Option<BookableResource>, PortError> {
        let sql = format!(
            "UPDATE tours SET name = $3, description = $4, location_id = $5, duration_days = $6, \
             price = $7, currency = $8, capacity = $9, available = $10, start_date = $11, \
             end_date = $12, guide = $13, updated_at = $14, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            TOUR_COLUMNS
        );
        let row = sqlx::query_as::<_, TourRow>(&sql)
            .bind(*tour.id.as_uuid())
            .bind(tour.version)
            .bind(&tour.name)
            .bind(&tour.description)
            .bind(tour.location_id.map(Uuid::from))
            .bind(i64::from(tour.duration_days))
            .bind(tour.price.amount())
            .bind(tour.price.currency().code())
            .bind(i64::from(tour.capacity))
            .bind(i64::from(tour.available))
            .bind(tour.start_date)
            .bind(tour.end_date)
            .bind(&tour.guide)
            .bind(tour.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        row.map(|r| Tour::try_from(r).map(Into::into)).transpose()
    }

    async fn insert_lodge(&self, lodge: &Lodge) -> Result<BookableResource, PortError> {
        let sql = format!(
            "INSERT INTO lodges ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {}",
            LODGE_COLUMNS, LODGE_COLUMNS
        );
        let row = sqlx::query_as::<_, LodgeRow>(&sql)
            .bind(*lodge.id.as_uuid())
            .bind(&lodge.name)
            .bind(&lodge.lodge_type)
            .bind(&lodge.address)
            .bind(&lodge.contact_number)
            .bind(lodge.location_id.map(Uuid::from))
            .bind(lodge.price_per_night.amount())
            .bind(lodge.price_per_night.currency().code())
            .bind(i64::from(lodge.total_rooms))
            .bind(i64::from(lodge.available_rooms))
            .bind(&lodge.amenities)
            .bind(lodge.rating)
            .bind(lodge.created_at)
            .bind(lodge.updated_at)
            .bind(lodge.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        Ok(Lodge::try_from(row)?.into())
    }

    async fn update_lodge(&self, lodge: &Lodge) -> Result<Option<BookableResource>, PortError> {
        let sql = format!(
            "UPDATE lodges SET name = $3, lodge_type = $4, address = $5, contact_number = $6, \
             location_id = $7, price_per_night = $8, currency = $9, total_rooms = $10, \
             available_rooms = $11, amenities = $12, rating = $13, updated_at = $14, \
             version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            LODGE_COLUMNS
        );
        let row = sqlx::query_as::<_, LodgeRow>(&sql)
            .bind(*lodge.id.as_uuid())
            .bind(lodge.version)
            .bind(&lodge.name)
            .bind(&lodge.lodge_type)
            .bind(&lodge.address)
            .bind(&lodge.contact_number)
            .bind(lodge.location_id.map(Uuid::from))
            .bind(lodge.price_per_night.amount())
            .bind(lodge.price_per_night.currency().code())
            .bind(i64::from(lodge.total_rooms))
            .bind(i64::from(lodge.available_rooms))
            .bind(&lodge.amenities)
            .bind(lodge.rating)
            .bind(lodge.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        row.map(|r| Lodge::try_from(r).map(Into::into)).transpose()
    }

    async fn insert_transport(&self, transport: &Transport) -> Result<BookableResource, PortError> {
        let sql = format!(
            "INSERT INTO transports ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {}",
            TRANSPORT_COLUMNS, TRANSPORT_COLUMNS
        );
        let row = sqlx::query_as::<_, TransportRow>(&sql)
            .bind(*transport.id.as_uuid())
            .bind(&transport.transport_type)
            .bind(&transport.provider)
            .bind(&transport.vehicle_number)
            .bind(transport.from_location_id.map(Uuid::from))
            .bind(transport.to_location_id.map(Uuid::from))
            .bind(transport.cost.amount())
            .bind(transport.cost.currency().code())
            .bind(i64::from(transport.capacity))
            .bind(i64::from(transport.available_seats))
            .bind(transport.created_at)
            .bind(transport.updated_at)
            .bind(transport.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        Ok(Transport::try_from(row)?.into())
    }

    async fn update_transport(&self, transport: &Transport) -> Result<Option<BookableResource>, PortError> {
        let sql = format!(
            "UPDATE transports SET transport_type = $3, provider = $4, vehicle_number = $5, \
             from_location_id = $6, to_location_id = $7, cost = $8, currency = $9, capacity = $10, \
             available_seats = $11, updated_at = $12, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            TRANSPORT_COLUMNS
        );
        let row = sqlx::query_as::<_, TransportRow>(&sql)
            .bind(*transport.id.as_uuid())
            .bind(transport.version)
            .bind(&transport.transport_type)
            .bind(&transport.provider)
            .bind(&transport.vehicle_number)
            .bind(transport.from_location_id.map(Uuid::from))
            .bind(transport.to_location_id.map(Uuid::from))
            .bind(transport.cost.amount())
            .bind(transport.cost.currency().code())
            .bind(i64::from(transport.capacity))
            .bind(i64::from(transport.available_seats))
            .bind(transport.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        row.map(|r| Transport::try_from(r).map(Into::into)).transpose()
    }
}

impl DomainPort for PostgresCatalogAdapter {}

#[async_trait]
impl HealthCheckable for PostgresCatalogAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-catalog-adapter").await
    }
}

#[async_trait]
impl CatalogPort for PostgresCatalogAdapter {
    // ========================================================================
    // Locations
    // ========================================================================

    #[instrument(skip(self), fields(location_id = %id))]
    async fn get_location(&self, id: LocationId) -> Result<Location, PortError> {
        let sql = format!("SELECT {} FROM locations WHERE id = $1", LOCATION_COLUMNS);
        sqlx::query_as::<_, LocationRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .map(Location::from)
            .ok_or_else(|| PortError::not_found("Location", id))
    }

    async fn list_locations(&self) -> Result<Vec<Location>, PortError> {
        let sql = format!("SELECT {} FROM locations ORDER BY name, id", LOCATION_COLUMNS);
        let rows = sqlx::query_as::<_, LocationRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn find_locations_by_country(&self, country: &str) -> Result<Vec<Location>, PortError> {
        self.find_locations("lower(country) = lower($1)", country).await
    }

    async fn search_locations(&self, keyword: &str) -> Result<Vec<Location>, PortError> {
        self.find_locations("name ILIKE $1", &format!("%{}%", keyword)).await
    }

    async fn location_exists(&self, id: LocationId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)")
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, location), fields(location_id = %location.id))]
    async fn insert_location(&self, location: &Location) -> Result<Location, PortError> {
        debug!("Inserting location");
        let sql = format!(
            "INSERT INTO locations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            LOCATION_COLUMNS, LOCATION_COLUMNS
        );
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(*location.id.as_uuid())
            .bind(&location.name)
            .bind(&location.country)
            .bind(&location.state)
            .bind(&location.city)
            .bind(&location.description)
            .bind(&location.climate)
            .bind(&location.best_time_to_visit)
            .bind(&location.popular_attractions)
            .bind(location.created_at)
            .bind(location.updated_at)
            .bind(location.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        Ok(row.into())
    }

    #[instrument(skip(self, location), fields(location_id = %location.id, version = location.version))]
    async fn update_location(&self, location: &Location) -> Result<Location, PortError> {
        let sql = format!(
            "UPDATE locations SET name = $3, country = $4, state = $5, city = $6, description = $7, \
             climate = $8, best_time_to_visit = $9, popular_attractions = $10, updated_at = $11, \
             version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            LOCATION_COLUMNS
        );
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(*location.id.as_uuid())
            .bind(location.version)
            .bind(&location.name)
            .bind(&location.country)
            .bind(&location.state)
            .bind(&location.city)
            .bind(&location.description)
            .bind(&location.climate)
            .bind(&location.best_time_to_visit)
            .bind(&location.popular_attractions)
            .bind(location.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(stale_or_missing(
                self.location_exists(location.id).await?,
                "Location",
                location.id,
                location.version,
            )),
        }
    }

    #[instrument(skip(self), fields(location_id = %id))]
    async fn delete_location(&self, id: LocationId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Location", id));
        }
        Ok(())
    }

    // ========================================================================
    // Bookable resources
    // ========================================================================

    #[instrument(skip(self), fields(resource = %resource))]
    async fn get_resource(&self, resource: ResourceRef) -> Result<BookableResource, PortError> {
        debug!("Fetching resource");
        let table = Table::of(resource.kind());
        let sql = format!("SELECT {} FROM {} WHERE id = $1", table.columns, table.name);
        let id = resource.uuid();

        let found = match resource.kind() {
            ResourceKind::Tour => sqlx::query_as::<_, TourRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_to_port_error)?
                .map(|row| Tour::try_from(row).map(BookableResource::from))
                .transpose()?,
            ResourceKind::Lodge => sqlx::query_as::<_, LodgeRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_to_port_error)?
                .map(|row| Lodge::try_from(row).map(BookableResource::from))
                .transpose()?,
            ResourceKind::Transport => sqlx::query_as::<_, TransportRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_to_port_error)?
                .map(|row| Transport::try_from(row).map(BookableResource::from))
                .transpose()?,
        };
        found.ok_or_else(|| PortError::not_found(table.entity, resource))
    }

    #[instrument(skip(self, query))]
    async fn find_resources(&self, query: &ResourceQuery) -> Result<Vec<BookableResource>, PortError> {
        let kinds = match query.kind {
            Some(kind) => vec![kind],
            None => vec![ResourceKind::Tour, ResourceKind::Lodge, ResourceKind::Transport],
        };

        let mut found = Vec::new();
        for kind in kinds {
            found.extend(self.search(kind, query).await?);
        }
        // ILIKE treats `%` and `_` in the keyword as wildcards
        found.retain(|resource| query.matches(resource));
        found.sort_by(|a, b| a.name().cmp(b.name()));
        debug!(count = found.len(), "Resources found");
        Ok(found)
    }

    async fn resource_exists(&self, resource: ResourceRef) -> Result<bool, PortError> {
        let table = Table::of(resource.kind());
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table.name);
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(resource.uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, resource), fields(resource = %resource.resource_ref()))]
    async fn insert_resource(&self, resource: &BookableResource) -> Result<BookableResource, PortError> {
        debug!("Inserting resource");
        match resource {
            BookableResource::Tour(tour) => self.insert_tour(tour).await,
            BookableResource::Lodge(lodge) => self.insert_lodge(lodge).await,
            BookableResource::Transport(transport) => self.insert_transport(transport).await,
        }
    }

    #[instrument(
        skip(self, resource),
        fields(resource = %resource.resource_ref(), version = resource.version(), available = resource.available())
    )]
    async fn save_resource(&self, resource: &BookableResource) -> Result<BookableResource, PortError> {
        let saved = match resource {
            BookableResource::Tour(tour) => self.update_tour(tour).await?,
            BookableResource::Lodge(lodge) => self.update_lodge(lodge).await?,
            BookableResource::Transport(transport) => self.update_transport(transport).await?,
        };

        match saved {
            Some(saved) => Ok(saved),
            None => {
                let reference = resource.resource_ref();
                Err(stale_or_missing(
                    self.resource_exists(reference).await?,
                    Table::of(reference.kind()).entity,
                    reference,
                    resource.version(),
                ))
            }
        }
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn delete_resource(&self, resource: ResourceRef) -> Result<(), PortError> {
        let table = Table::of(resource.kind());
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name);
        let result = sqlx::query(&sql)
            .bind(resource.uuid())
            .execute(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found(table.entity, resource));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn tour_row() -> TourRow {
        TourRow {
            id: Uuid::new_v4(),
            name: "Skardu Lakes".to_string(),
            description: None,
            location_id: Some(Uuid::new_v4()),
            duration_days: 5,
            price: dec!(320.5),
            currency: "USD".to_string(),
            capacity: 12,
            available: 9,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
            guide: Some("Karim".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 2,
        }
    }

    #[test]
    fn test_tour_row_conversion() {
        let tour = Tour::try_from(tour_row()).unwrap();
        assert_eq!(tour.price.currency(), Currency::USD);
        assert_eq!(tour.price.amount(), dec!(320.5));
        assert_eq!(tour.available, 9);
        assert!(tour.location_id.is_some());
    }

    #[test]
    fn test_negative_counter_is_corrupt() {
        let mut row = tour_row();
        row.available = -1;
        assert!(matches!(Tour::try_from(row), Err(PortError::Internal { .. })));
    }

    #[test]
    fn test_lodge_row_conversion() {
        let row = LodgeRow {
            id: Uuid::new_v4(),
            name: "Serena Gilgit".to_string(),
            lodge_type: "HOTEL".to_string(),
            address: None,
            contact_number: None,
            location_id: None,
            price_per_night: dec!(90),
            currency: "PKR".to_string(),
            total_rooms: 40,
            available_rooms: 40,
            amenities: vec!["wifi".to_string()],
            rating: Some(dec!(4.5)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        };
        let lodge = Lodge::try_from(row).unwrap();
        assert_eq!(lodge.price_per_night.currency(), Currency::PKR);
        assert_eq!(lodge.amenities, vec!["wifi".to_string()]);
    }

    #[test]
    fn test_tables_by_kind() {
        assert_eq!(Table::of(ResourceKind::Lodge).available_column, "available_rooms");
        assert_eq!(Table::of(ResourceKind::Transport).name_column, "provider");
        assert_eq!(Table::of(ResourceKind::Tour).entity, "Tour");
    }
}
