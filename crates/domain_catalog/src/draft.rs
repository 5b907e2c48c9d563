//! Administrative input for creating or replacing catalog resources
//!
//! Counts arrive as `i64` straight from the caller and are validated into
//! `u32` by the catalog service.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{LocationId, Money};

#[derive(Debug, Clone)]
pub struct TourDraft {
    pub name: String,
    pub description: Option<String>,
    pub location_id: Option<LocationId>,
    pub duration_days: i64,
    pub price: Money,
    pub capacity: i64,
    /// Defaults to `capacity` on create and to the current value on update
    pub available: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guide: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LodgeDraft {
    pub name: String,
    pub lodge_type: String,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub location_id: Option<LocationId>,
    pub price_per_night: Money,
    pub total_rooms: i64,
    pub available_rooms: Option<i64>,
    pub amenities: Vec<String>,
    pub rating: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct TransportDraft {
    pub transport_type: String,
    pub provider: String,
    pub vehicle_number: Option<String>,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub cost: Money,
    pub capacity: i64,
    pub available_seats: Option<i64>,
}
