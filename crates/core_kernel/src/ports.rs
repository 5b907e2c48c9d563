//! Ports and Adapters Infrastructure
//!
//! Shared plumbing for the hexagonal layout used by every domain crate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Services                      │
//! │   (InventoryLedger, BookingService, PaymentService, ...)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Port Traits                           │
//! │    (UserPort, CatalogPort, BookingPort, PaymentPort)         │
//! │   Defined in each domain, depend only on core_kernel         │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │  Postgres Adapter │     │   Mock Adapter   │
//!         │     (infra_db)    │     │ (feature "mock") │
//!         └───────────────────┘     └──────────────────┘
//! ```
//!
//! Every save of an existing entity is a compare-and-set on its `version`
//! column. An adapter that finds a different stored version must return
//! [`PortError::Conflict`] and leave the record untouched.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Classify, ErrorKind};

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across the Postgres and mock adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The stored record was rejected by a storage-level constraint
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The stored version differs from the one the caller loaded
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// A unique key is already taken
    #[error("Duplicate: {message}")]
    Duplicate {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Conflict error for a lost compare-and-set
    pub fn conflict(entity_type: &str, id: impl fmt::Display, expected_version: i64) -> Self {
        PortError::Conflict {
            message: format!(
                "{} {} was modified concurrently (expected version {})",
                entity_type, id, expected_version
            ),
        }
    }

    /// Creates a Duplicate error
    pub fn duplicate(message: impl Into<String>) -> Self {
        PortError::Duplicate {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

impl Classify for PortError {
    fn kind(&self) -> ErrorKind {
        match self {
            PortError::NotFound { .. } => ErrorKind::NotFound,
            PortError::Validation { .. } => ErrorKind::InvalidInput,
            PortError::Conflict { .. } => ErrorKind::Conflict,
            PortError::Duplicate { .. } => ErrorKind::Duplicate,
            PortError::Connection { .. } | PortError::Timeout { .. } => ErrorKind::Unavailable,
            PortError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: chrono::Utc::now(),
        }
    }
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}
