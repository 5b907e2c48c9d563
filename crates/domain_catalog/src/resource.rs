//! Bookable resources
//!
//! Tours, lodges and transports all carry a finite counter of remaining
//! units. The [`BookableResource`] sum type gives the inventory ledger one
//! uniform view over them: `capacity`, `available`, `unit_price`, `version`
//! and the type-specific expiry policy.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{LocationId, LodgeId, Money, TourId, TransportId};

/// The three kinds of bookable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Tour,
    Lodge,
    Transport,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Tour => "TOUR",
            ResourceKind::Lodge => "LODGE",
            ResourceKind::Transport => "TRANSPORT",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOUR" | "TOURS" => Ok(ResourceKind::Tour),
            "LODGE" | "LODGES" => Ok(ResourceKind::Lodge),
            "TRANSPORT" | "TRANSPORTS" => Ok(ResourceKind::Transport),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}

/// Typed address of a bookable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceRef {
    Tour(TourId),
    Lodge(LodgeId),
    Transport(TransportId),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Tour(_) => ResourceKind::Tour,
            ResourceRef::Lodge(_) => ResourceKind::Lodge,
            ResourceRef::Transport(_) => ResourceKind::Transport,
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            ResourceRef::Tour(id) => *id.as_uuid(),
            ResourceRef::Lodge(id) => *id.as_uuid(),
            ResourceRef::Transport(id) => *id.as_uuid(),
        }
    }

    /// Rebuilds a reference from its storage columns
    pub fn from_parts(kind: ResourceKind, id: Uuid) -> Self {
        match kind {
            ResourceKind::Tour => ResourceRef::Tour(TourId::from_uuid(id)),
            ResourceKind::Lodge => ResourceRef::Lodge(LodgeId::from_uuid(id)),
            ResourceKind::Transport => ResourceRef::Transport(TransportId::from_uuid(id)),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Tour(id) => id.fmt(f),
            ResourceRef::Lodge(id) => id.fmt(f),
            ResourceRef::Transport(id) => id.fmt(f),
        }
    }
}

impl From<TourId> for ResourceRef {
    fn from(id: TourId) -> Self {
        ResourceRef::Tour(id)
    }
}

impl From<LodgeId> for ResourceRef {
    fn from(id: LodgeId) -> Self {
        ResourceRef::Lodge(id)
    }
}

impl From<TransportId> for ResourceRef {
    fn from(id: TransportId) -> Self {
        ResourceRef::Transport(id)
    }
}

/// A guided tour with a fixed departure date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    pub name: String,
    pub description: Option<String>,
    pub location_id: Option<LocationId>,
    pub duration_days: u32,
    /// Price per person
    pub price: Money,
    /// Total seats
    pub capacity: u32,
    /// Remaining seats
    pub available: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guide: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// A hotel, guest house or camp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lodge {
    pub id: LodgeId,
    pub name: String,
    /// Free-form category such as "HOTEL" or "RESORT"
    pub lodge_type: String,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub location_id: Option<LocationId>,
    pub price_per_night: Money,
    pub total_rooms: u32,
    pub available_rooms: u32,
    pub amenities: Vec<String>,
    /// Guest rating between 0 and 5
    pub rating: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// A bus, jeep or flight between two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub id: TransportId,
    /// Free-form category such as "BUS" or "FLIGHT"
    pub transport_type: String,
    pub provider: String,
    pub vehicle_number: Option<String>,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    /// Fare per seat
    pub cost: Money,
    pub capacity: u32,
    pub available_seats: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Any inventory-bearing entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookableResource {
    Tour(Tour),
    Lodge(Lodge),
    Transport(Transport),
}

impl BookableResource {
    pub fn resource_ref(&self) -> ResourceRef {
        match self {
            BookableResource::Tour(t) => ResourceRef::Tour(t.id),
            BookableResource::Lodge(l) => ResourceRef::Lodge(l.id),
            BookableResource::Transport(t) => ResourceRef::Transport(t.id),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource_ref().kind()
    }

    /// Display name; transports are named by their provider
    pub fn name(&self) -> &str {
        match self {
            BookableResource::Tour(t) => &t.name,
            BookableResource::Lodge(l) => &l.name,
            BookableResource::Transport(t) => &t.provider,
        }
    }

    pub fn capacity(&self) -> u32 {
        match self {
            BookableResource::Tour(t) => t.capacity,
            BookableResource::Lodge(l) => l.total_rooms,
            BookableResource::Transport(t) => t.capacity,
        }
    }

    pub fn available(&self) -> u32 {
        match self {
            BookableResource::Tour(t) => t.available,
            BookableResource::Lodge(l) => l.available_rooms,
            BookableResource::Transport(t) => t.available_seats,
        }
    }

    pub(crate) fn set_available(&mut self, available: u32, at: DateTime<Utc>) {
        match self {
            BookableResource::Tour(t) => {
                t.available = available;
                t.updated_at = at;
            }
            BookableResource::Lodge(l) => {
                l.available_rooms = available;
                l.updated_at = at;
            }
            BookableResource::Transport(t) => {
                t.available_seats = available;
                t.updated_at = at;
            }
        }
    }

    /// Price of one unit (seat, room-night or ticket)
    pub fn unit_price(&self) -> Money {
        match self {
            BookableResource::Tour(t) => t.price,
            BookableResource::Lodge(l) => l.price_per_night,
            BookableResource::Transport(t) => t.cost,
        }
    }

    pub fn version(&self) -> i64 {
        match self {
            BookableResource::Tour(t) => t.version,
            BookableResource::Lodge(l) => l.version,
            BookableResource::Transport(t) => t.version,
        }
    }

    pub fn set_version(&mut self, version: i64) {
        match self {
            BookableResource::Tour(t) => t.version = version,
            BookableResource::Lodge(l) => l.version = version,
            BookableResource::Transport(t) => t.version = version,
        }
    }

    /// Returns the start date if the resource can no longer be booked on `today`.
    ///
    /// Only tours expire. Lodges and transports have no departure date in the
    /// catalog and are always bookable while units remain.
    pub fn expired_on(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            BookableResource::Tour(t) if t.start_date < today => Some(t.start_date),
            _ => None,
        }
    }

    /// Locations this resource is attached to
    pub fn location_ids(&self) -> Vec<LocationId> {
        match self {
            BookableResource::Tour(t) => t.location_id.into_iter().collect(),
            BookableResource::Lodge(l) => l.location_id.into_iter().collect(),
            BookableResource::Transport(t) => t
                .from_location_id
                .into_iter()
                .chain(t.to_location_id)
                .collect(),
        }
    }

    /// Booked fraction of capacity, between 0.0 and 1.0
    pub fn utilization(&self) -> f64 {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0.0;
        }
        1.0 - (f64::from(self.available()) / f64::from(capacity))
    }

    pub fn into_tour(self) -> Option<Tour> {
        match self {
            BookableResource::Tour(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_lodge(self) -> Option<Lodge> {
        match self {
            BookableResource::Lodge(l) => Some(l),
            _ => None,
        }
    }

    pub fn into_transport(self) -> Option<Transport> {
        match self {
            BookableResource::Transport(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Tour> for BookableResource {
    fn from(tour: Tour) -> Self {
        BookableResource::Tour(tour)
    }
}

impl From<Lodge> for BookableResource {
    fn from(lodge: Lodge) -> Self {
        BookableResource::Lodge(lodge)
    }
}

impl From<Transport> for BookableResource {
    fn from(transport: Transport) -> Self {
        BookableResource::Transport(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn tour(start: NaiveDate) -> BookableResource {
        let now = Utc::now();
        BookableResource::Tour(Tour {
            id: TourId::new(),
            name: "Fairy Meadows Trek".to_string(),
            description: None,
            location_id: None,
            duration_days: 4,
            price: Money::new(dec!(150), Currency::USD),
            capacity: 10,
            available: 7,
            start_date: start,
            end_date: start + chrono::Duration::days(4),
            guide: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    #[test]
    fn test_tour_expiry_is_strictly_before_today() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        assert!(tour(today).expired_on(today).is_none());
        assert!(tour(today.pred_opt().unwrap()).expired_on(today).is_some());
    }

    #[test]
    fn test_utilization() {
        let resource = tour(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert!((resource.utilization() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_resource_ref_serde_shape() {
        let id = TourId::new();
        let value = serde_json::to_value(ResourceRef::Tour(id)).unwrap();
        assert_eq!(value["kind"], "TOUR");
        assert_eq!(value["id"], id.as_uuid().to_string());
    }

    #[test]
    fn test_resource_kind_parse() {
        assert_eq!("lodges".parse::<ResourceKind>().unwrap(), ResourceKind::Lodge);
        assert!("boat".parse::<ResourceKind>().is_err());
    }
}
