//! PostgreSQL Payment Adapter
//!
//! The partial unique index `payments_one_completed_per_booking` backs the
//! at-most-one-COMPLETED rule across processes; a second settlement surfaces
//! as `PortError::Duplicate`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{BookingId, DomainPort, HealthCheckResult, HealthCheckable, PaymentId, PortError};
use domain_payment::{Payment, PaymentMethod, PaymentPort, PaymentStatus};

use super::{money, parse, ping, stale_or_missing};
use crate::error::db_to_port_error;

const COLUMNS: &str = "id, booking_id, amount, currency, method, status, transaction_id, \
    payment_date, completed_at, failure_reason, created_at, updated_at, version";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    status: String,
    transaction_id: String,
    payment_date: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = PortError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from(row.id),
            booking_id: BookingId::from(row.booking_id),
            amount: money(row.amount, &row.currency)?,
            method: parse::<PaymentMethod>("method", &row.method)?,
            status: parse::<PaymentStatus>("status", &row.status)?,
            transaction_id: row.transaction_id,
            payment_date: row.payment_date,
            completed_at: row.completed_at,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn into_payments(rows: Vec<PaymentRow>) -> Result<Vec<Payment>, PortError> {
    rows.into_iter().map(Payment::try_from).collect()
}

/// PostgreSQL-backed implementation of [`PaymentPort`]
#[derive(Debug, Clone)]
pub struct PostgresPaymentAdapter {
    pool: PgPool,
}

impl PostgresPaymentAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: PaymentId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM payments WHERE id = $1)")
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }

    async fn find_where(&self, clause: &str, bind: &str) -> Result<Vec<Payment>, PortError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE {} ORDER BY created_at, id",
            COLUMNS, clause
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_payments(rows)
    }
}

impl DomainPort for PostgresPaymentAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPaymentAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-payment-adapter").await
    }
}

#[async_trait]
impl PaymentPort for PostgresPaymentAdapter {
    #[instrument(skip(self), fields(payment_id = %id))]
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        debug!("Fetching payment by ID");
        let sql = format!("SELECT {} FROM payments WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Payment", id))?
            .try_into()
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, PortError> {
        let sql = format!("SELECT {} FROM payments ORDER BY created_at, id", COLUMNS);
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_payments(rows)
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>, PortError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE booking_id = $1 ORDER BY created_at, id",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(*booking_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_payments(rows)
    }

    async fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, PortError> {
        self.find_where("status = $1", status.as_str()).await
    }

    async fn find_by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, PortError> {
        self.find_where("method = $1", method.as_str()).await
    }

    async fn exists_by_transaction_id(&self, transaction_id: &str) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM payments WHERE transaction_id = $1)")
            .bind(transaction_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id, booking_id = %payment.booking_id))]
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, PortError> {
        debug!("Inserting payment");
        let sql = format!(
            "INSERT INTO payments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {}",
            COLUMNS, COLUMNS
        );
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(*payment.id.as_uuid())
            .bind(*payment.booking_id.as_uuid())
            .bind(payment.amount.amount())
            .bind(payment.amount.currency().code())
            .bind(payment.method.as_str())
            .bind(payment.status.as_str())
            .bind(&payment.transaction_id)
            .bind(payment.payment_date)
            .bind(payment.completed_at)
            .bind(&payment.failure_reason)
            .bind(payment.created_at)
            .bind(payment.updated_at)
            .bind(payment.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .try_into()
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id, version = payment.version))]
    async fn update_payment(&self, payment: &Payment) -> Result<Payment, PortError> {
        debug!(status = %payment.status, "Updating payment");
        let sql = format!(
            "UPDATE payments SET amount = $3, currency = $4, method = $5, status = $6, \
             payment_date = $7, completed_at = $8, failure_reason = $9, updated_at = $10, \
             version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(*payment.id.as_uuid())
            .bind(payment.version)
            .bind(payment.amount.amount())
            .bind(payment.amount.currency().code())
            .bind(payment.method.as_str())
            .bind(payment.status.as_str())
            .bind(payment.payment_date)
            .bind(payment.completed_at)
            .bind(&payment.failure_reason)
            .bind(payment.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;

        match row {
            Some(row) => row.try_into(),
            None => Err(stale_or_missing(
                self.exists(payment.id).await?,
                "Payment",
                payment.id,
                payment.version,
            )),
        }
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn delete_payment(&self, id: PaymentId, version: i64) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND version = $2")
            .bind(*id.as_uuid())
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        if result.rows_affected() == 0 {
            return Err(stale_or_missing(self.exists(id).await?, "Payment", id, version));
        }
        Ok(())
    }
}
