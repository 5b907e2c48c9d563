//! PostgreSQL User Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId};
use domain_user::{User, UserPort, UserRole};

use super::{parse, ping, stale_or_missing};
use crate::error::db_to_port_error;

const COLUMNS: &str = "id, name, email, phone, address, role, created_at, updated_at, version";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<UserRow> for User {
    type Error = PortError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            role: parse::<UserRole>("role", &row.role)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn into_users(rows: Vec<UserRow>) -> Result<Vec<User>, PortError> {
    rows.into_iter().map(User::try_from).collect()
}

/// PostgreSQL-backed implementation of [`UserPort`]
#[derive(Debug, Clone)]
pub struct PostgresUserAdapter {
    pool: PgPool,
}

impl PostgresUserAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresUserAdapter {}

#[async_trait]
impl HealthCheckable for PostgresUserAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-user-adapter").await
    }
}

#[async_trait]
impl UserPort for PostgresUserAdapter {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_user(&self, id: UserId) -> Result<User, PortError> {
        debug!("Fetching user by ID");
        let sql = format!("SELECT {} FROM users WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("User", id))?
            .try_into()
    }

    async fn list_users(&self) -> Result<Vec<User>, PortError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, id", COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_users(rows)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_role(&self, role: UserRole) -> Result<Vec<User>, PortError> {
        let sql = format!("SELECT {} FROM users WHERE role = $1 ORDER BY created_at, id", COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        into_users(rows)
    }

    async fn exists(&self, id: UserId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert_user(&self, user: &User) -> Result<User, PortError> {
        debug!("Inserting user");
        let sql = format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            COLUMNS, COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(*user.id.as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.address)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(user.version)
            .fetch_one(&self.pool)
            .await
            .map_err(db_to_port_error)?
            .try_into()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, version = user.version))]
    async fn update_user(&self, user: &User) -> Result<User, PortError> {
        debug!("Updating user");
        let sql = format!(
            "UPDATE users SET name = $3, email = $4, phone = $5, address = $6, role = $7, \
             updated_at = $8, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(*user.id.as_uuid())
            .bind(user.version)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.address)
            .bind(user.role.as_str())
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_to_port_error)?;

        match row {
            Some(row) => row.try_into(),
            None => Err(stale_or_missing(self.exists(user.id).await?, "User", user.id, user.version)),
        }
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: UserId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_to_port_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("User", id));
        }
        Ok(())
    }
}
