//! Catalog and inventory errors

use chrono::NaiveDate;
use thiserror::Error;

use core_kernel::{Classify, ErrorKind, LocationId, MoneyError, PortError, ValidationError};

use crate::resource::ResourceRef;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Location not found: {0}")]
    LocationNotFound(LocationId),

    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceRef),

    /// Fewer units remain than were requested
    #[error("Insufficient capacity on {resource}: requested {requested}, available {available}")]
    InsufficientCapacity {
        resource: ResourceRef,
        requested: u32,
        available: u32,
    },

    /// Releasing would leave more units available than exist
    #[error("Capacity exceeded on {resource}: releasing {requested} onto {available} of {capacity}")]
    CapacityExceeded {
        resource: ResourceRef,
        requested: u32,
        available: u32,
        capacity: u32,
    },

    #[error("{resource} expired: started on {start_date}")]
    Expired {
        resource: ResourceRef,
        start_date: NaiveDate,
    },

    /// Live bookings still hold units of the resource
    #[error("{resource} still has active bookings")]
    ResourceInUse { resource: ResourceRef },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl CatalogError {
    /// Maps a port NotFound on a resource lookup to `ResourceNotFound`
    pub(crate) fn from_resource_lookup(resource: ResourceRef, err: PortError) -> Self {
        if err.is_not_found() {
            CatalogError::ResourceNotFound(resource)
        } else {
            CatalogError::Port(err)
        }
    }

    pub(crate) fn from_location_lookup(id: LocationId, err: PortError) -> Self {
        if err.is_not_found() {
            CatalogError::LocationNotFound(id)
        } else {
            CatalogError::Port(err)
        }
    }
}

impl Classify for CatalogError {
    fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(e) => e.kind(),
            CatalogError::LocationNotFound(_) | CatalogError::ResourceNotFound(_) => {
                ErrorKind::NotFound
            }
            CatalogError::InsufficientCapacity { .. } => ErrorKind::InsufficientCapacity,
            CatalogError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            CatalogError::Expired { .. } => ErrorKind::Expired,
            CatalogError::ResourceInUse { .. } => ErrorKind::DeletionNotAllowed,
            CatalogError::Money(_) => ErrorKind::Internal,
            CatalogError::Port(e) => e.kind(),
        }
    }
}
