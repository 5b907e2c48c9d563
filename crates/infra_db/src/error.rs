//! Database error types
//!
//! SQLx failures are classified by PostgreSQL error code and then lowered
//! into the [`PortError`] that every domain port speaks.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored row cannot be turned back into a domain value
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    pub fn corrupt(column: &str, detail: impl std::fmt::Display) -> Self {
        DatabaseError::CorruptRow(format!("{}: {}", column, detail))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Maps SQLx errors to the specific variant for their PostgreSQL error code
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Tls(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::PoolClosed => DatabaseError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DatabaseError::corrupt(&index, source)
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => {
                PortError::connection(error.to_string())
            }
            DatabaseError::NotFound(message) => PortError::not_found("Record", message),
            DatabaseError::DuplicateEntry(message) => PortError::duplicate(message),
            DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::ConstraintViolation(message) => PortError::validation(message),
            other => PortError::internal(other.to_string()),
        }
    }
}

/// Shorthand used by the adapters
pub(crate) fn db_to_port_error(error: sqlx::Error) -> PortError {
    DatabaseError::from(error).into()
}
