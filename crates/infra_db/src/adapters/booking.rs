//! PostgreSQL Booking Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{BookingId, DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId};
use domain_booking::{Booking, BookingPort, BookingStatus};
use domain_catalog::{ResourceKind, ResourceRef};

use super::{count, money, parse, ping, stale_or_missing};
use crate::error::db_to_port_error;

const COLUMNS: &str = "id, user_id, resource_kind, resource_id, quantity, status, unit_price, \
    total_amount, currency, special_requests, booking_date, updated_at, version";

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    resource_kind: String,
    resource_id: Uuid,
    quantity: i64,
    status: String,
    unit_price: Decimal,
    total_amount: Decimal,
    currency: String,
    special_requests: Option<String>,
    booking_date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<BookingRow> for Booking {
    type Error = PortError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let kind = parse::<ResourceKind>("resource_kind", &row.resource_kind)?;
        Ok(Booking {
            id: BookingId::from(row.id),
            user_id: UserId::from(row.user_id),
            resource: ResourceRef::from_parts(kind, row.resource_id),
            quantity: count("quantity", row.quantity)?,
            status: parse::<BookingStatus>("status", &row.status)?,
            unit_price: money(row.unit_price, &row.currency)?,
            total_amount: money(row.total_amount, &row.currency)?,
            special_requests: row.special_requests,
            booking_date: row.booking_date,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, PortError> {
    rows.into_iter().map(Booking::try_from).collect()
}

/// PostgreSQL-backed implementation of [`BookingPort`]
#[derive(Debug, Clone)]
pub struct PostgresBookingAdapter {
    pool: PgPool,
}

impl PostgresBookingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: BookingId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }
}

impl DomainPort for PostgresBookingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBookingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-booking-adapter").await
    }
}

#[async_trait]
impl BookingPort for PostgresBookingAdapter {
    #[instrument(skip(self), fields(booking_id = %id))]
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
        debug!("Fetching booking by ID");
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Booking", id))?
            .try_into()
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, PortError> {
        let sql = format!("SELECT {} FROM bookings ORDER BY booking_date, id", COLUMNS);
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_bookings(rows)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, PortError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_date, id",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(*user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_bookings(rows)
    }

    async fn find_by_resource(&self, resource: ResourceRef) -> Result<Vec<Booking>, PortError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE resource_kind = $1 AND resource_id = $2 \
             ORDER BY booking_date, id",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(resource.kind().as_str())
            .bind(resource.uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_bookings(rows)
    }

    async fn find_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, PortError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE status = $1 ORDER BY booking_date, id",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_bookings(rows)
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id, resource = %booking.resource))]
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, PortError> {
        debug!("Inserting booking");
        let sql = format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {}",
            COLUMNS, COLUMNS
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(*booking.id.as_uuid())
            .bind(*booking.user_id.as_uuid())
            .bind(booking.resource.kind().as_str())
            .bind(booking.resource.uuid())
            .bind(i64::from(booking.quantity))
            .bind(booking.status.as_str())
            .bind(booking.unit_price.amount())
            .bind(booking.total_amount.amount())
            .bind(booking.total_amount.currency().code())
            .bind(&booking.special_requests)
            .bind(booking.booking_date)
            .bind(booking.updated_at)
            .bind(booking.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .try_into()
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id, version = booking.version))]
    async fn update_booking(&self, booking: &Booking) -> Result<Booking, PortError> {
        debug!(status = %booking.status, "Updating booking");
        let sql = format!(
            "UPDATE bookings SET quantity = $3, status = $4, unit_price = $5, total_amount = $6, \
             currency = $7, special_requests = $8, updated_at = $9, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(*booking.id.as_uuid())
            .bind(booking.version)
            .bind(i64::from(booking.quantity))
            .bind(booking.status.as_str())
            .bind(booking.unit_price.amount())
            .bind(booking.total_amount.amount())
            .bind(booking.total_amount.currency().code())
            .bind(&booking.special_requests)
            .bind(booking.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;

        match row {
            Some(row) => row.try_into(),
            None => Err(stale_or_missing(
                self.exists(booking.id).await?,
                "Booking",
                booking.id,
                booking.version,
            )),
        }
    }

    #[instrument(skip(self), fields(booking_id = %id))]
    async fn delete_booking(&self, id: BookingId, version: i64) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1 AND version = $2")
            .bind(*id.as_uuid())
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        if result.rows_affected() == 0 {
            return Err(stale_or_missing(self.exists(id).await?, "Booking", id, version));
        }
        Ok(())
    }
}
