//! Catalog DTOs: locations, the three resource kinds and their search filters

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{validation, Currency, LocationId};
use domain_catalog::{
    LocationDraft, LodgeDraft, ResourceKind, ResourceQuery, ResourceRef, TourDraft, TransportDraft,
};

use super::money_in;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub climate: Option<String>,
    pub best_time_to_visit: Option<String>,
    #[serde(default)]
    pub popular_attractions: Vec<String>,
}

impl From<LocationRequest> for LocationDraft {
    fn from(req: LocationRequest) -> Self {
        LocationDraft {
            name: req.name,
            country: req.country,
            state: req.state,
            city: req.city,
            description: req.description,
            climate: req.climate,
            best_time_to_visit: req.best_time_to_visit,
            popular_attractions: req.popular_attractions,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub country: Option<String>,
    /// Keyword matched against name, city and description
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TourRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub location_id: Option<LocationId>,
    pub duration_days: i64,
    pub price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub capacity: i64,
    pub available: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 200))]
    pub guide: Option<String>,
}

impl TourRequest {
    pub fn into_draft(self, default: Currency) -> Result<TourDraft, ApiError> {
        Ok(TourDraft {
            price: money_in(self.price, self.currency.as_deref(), default)?,
            name: self.name,
            description: self.description,
            location_id: self.location_id,
            duration_days: self.duration_days,
            capacity: self.capacity,
            available: self.available,
            start_date: self.start_date,
            end_date: self.end_date,
            guide: self.guide,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LodgeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub lodge_type: String,
    pub address: Option<String>,
    #[validate(length(max = 30))]
    pub contact_number: Option<String>,
    pub location_id: Option<LocationId>,
    pub price_per_night: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub total_rooms: i64,
    pub available_rooms: Option<i64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub rating: Option<Decimal>,
}

impl LodgeRequest {
    pub fn into_draft(self, default: Currency) -> Result<LodgeDraft, ApiError> {
        Ok(LodgeDraft {
            price_per_night: money_in(self.price_per_night, self.currency.as_deref(), default)?,
            name: self.name,
            lodge_type: self.lodge_type,
            address: self.address,
            contact_number: self.contact_number,
            location_id: self.location_id,
            total_rooms: self.total_rooms,
            available_rooms: self.available_rooms,
            amenities: self.amenities,
            rating: self.rating,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransportRequest {
    #[validate(length(min = 1, max = 50))]
    pub transport_type: String,
    #[validate(length(min = 1, max = 200))]
    pub provider: String,
    #[validate(length(max = 50))]
    pub vehicle_number: Option<String>,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub cost: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub capacity: i64,
    pub available_seats: Option<i64>,
}

impl TransportRequest {
    pub fn into_draft(self, default: Currency) -> Result<TransportDraft, ApiError> {
        Ok(TransportDraft {
            cost: money_in(self.cost, self.currency.as_deref(), default)?,
            transport_type: self.transport_type,
            provider: self.provider,
            vehicle_number: self.vehicle_number,
            from_location_id: self.from_location_id,
            to_location_id: self.to_location_id,
            capacity: self.capacity,
            available_seats: self.available_seats,
        })
    }
}

/// Query string shared by the three resource listings. Filters that do not
/// apply to the listed kind are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceSearchParams {
    pub location_id: Option<LocationId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive name keyword
    pub q: Option<String>,
    /// Only resources with units left
    pub available: Option<bool>,
    pub start_from: Option<NaiveDate>,
    pub start_to: Option<NaiveDate>,
    pub lodge_type: Option<String>,
    pub min_rating: Option<Decimal>,
    pub transport_type: Option<String>,
    pub provider: Option<String>,
    pub from: Option<LocationId>,
    pub to: Option<LocationId>,
}

impl ResourceSearchParams {
    pub fn into_query(self, kind: ResourceKind) -> Result<ResourceQuery, ApiError> {
        let min_price = self.min_price.unwrap_or(Decimal::ZERO);
        if let Some(max_price) = self.max_price {
            validation::price_range("price", min_price, max_price)?;
        } else if self.min_price.is_some() {
            validation::price_range("price", min_price, Decimal::MAX)?;
        }
        if let (Some(from), Some(to)) = (self.start_from, self.start_to) {
            validation::ordered("start_date", &from, &to)?;
        }
        if let Some(rating) = self.min_rating {
            validation::within("min_rating", rating, Decimal::ZERO, Decimal::from(5))?;
        }

        Ok(ResourceQuery {
            kind: Some(kind),
            location_id: self.location_id,
            min_price: self.min_price,
            max_price: self.max_price,
            name_contains: self.q.filter(|q| !q.trim().is_empty()),
            available_only: self.available.unwrap_or(false),
            start_from: self.start_from,
            start_to: self.start_to,
            lodge_type: self.lodge_type,
            min_rating: self.min_rating,
            transport_type: self.transport_type,
            provider: self.provider,
            from_location_id: self.from,
            to_location_id: self.to,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub resource: ResourceRef,
    pub requested: i64,
    pub bookable: bool,
    pub available: u32,
    pub capacity: u32,
    pub utilization: f64,
}
