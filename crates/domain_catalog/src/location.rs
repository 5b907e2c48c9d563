//! Destinations that tours, lodges and transports are attached to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::LocationId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub climate: Option<String>,
    pub best_time_to_visit: Option<String>,
    pub popular_attractions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Input for creating or replacing a location
#[derive(Debug, Clone, Default)]
pub struct LocationDraft {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub climate: Option<String>,
    pub best_time_to_visit: Option<String>,
    pub popular_attractions: Vec<String>,
}

impl LocationDraft {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            ..Default::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}
