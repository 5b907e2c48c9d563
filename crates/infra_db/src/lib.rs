//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for every domain port, built on SQLx.
//!
//! # Architecture
//!
//! Each domain port (`UserPort`, `CatalogPort`, `BookingPort`, `PaymentPort`)
//! has a `Postgres*Adapter` under [`adapters`]. Queries are built at runtime
//! with `sqlx::query_as` and mapped through `FromRow` structs, so the crate
//! builds without a live database.
//!
//! # Optimistic concurrency
//!
//! Every row has a `version` column. Saves run as
//! `UPDATE ... WHERE id = $1 AND version = $2` and bump the version; a save
//! that matches no row becomes `PortError::Conflict` (or `NotFound` when
//! the row is gone).
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/travel")).await?;
//! run_migrations(&pool).await?;
//! let bookings = PostgresBookingAdapter::new(pool.clone());
//! ```

pub mod adapters;
pub mod error;
pub mod pool;

pub use adapters::{
    PostgresBookingAdapter, PostgresCatalogAdapter, PostgresPaymentAdapter, PostgresUserAdapter,
};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
