//! Test Data Builders
//!
//! Builders for the administrative drafts the catalog service accepts and
//! for user registrations. Tests set only the fields they care about.

use chrono::NaiveDate;
use core_kernel::{LocationId, Money};
use domain_catalog::{LocationDraft, LodgeDraft, TourDraft, TransportDraft};
use domain_user::{NewUser, UserRole};
use rust_decimal::Decimal;

use crate::fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for [`TourDraft`]
#[derive(Debug, Clone)]
pub struct TourBuilder {
    draft: TourDraft,
}

impl Default for TourBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TourBuilder {
    pub fn new() -> Self {
        Self {
            draft: TourDraft {
                name: StringFixtures::tour_name().to_string(),
                description: Some("Base camp views of Nanga Parbat".to_string()),
                location_id: None,
                duration_days: 5,
                price: MoneyFixtures::tour_price(),
                capacity: 10,
                available: None,
                start_date: TemporalFixtures::tour_start(),
                end_date: TemporalFixtures::tour_end(),
                guide: None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.draft.name = name.into();
        self
    }

    pub fn price(mut self, price: Money) -> Self {
        self.draft.price = price;
        self
    }

    pub fn capacity(mut self, capacity: i64) -> Self {
        self.draft.capacity = capacity;
        self
    }

    pub fn available(mut self, available: i64) -> Self {
        self.draft.available = Some(available);
        self
    }

    pub fn location(mut self, location_id: LocationId) -> Self {
        self.draft.location_id = Some(location_id);
        self
    }

    /// Sets the departure and keeps the duration
    pub fn starting(mut self, start: NaiveDate) -> Self {
        self.draft.end_date = start + chrono::Duration::days(self.draft.duration_days);
        self.draft.start_date = start;
        self
    }

    pub fn guide(mut self, guide: impl Into<String>) -> Self {
        self.draft.guide = Some(guide.into());
        self
    }

    pub fn build(self) -> TourDraft {
        self.draft
    }
}

/// Builder for [`LodgeDraft`]
#[derive(Debug, Clone)]
pub struct LodgeBuilder {
    draft: LodgeDraft,
}

impl Default for LodgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LodgeBuilder {
    pub fn new() -> Self {
        Self {
            draft: LodgeDraft {
                name: StringFixtures::lodge_name().to_string(),
                lodge_type: "HOTEL".to_string(),
                address: None,
                contact_number: None,
                location_id: None,
                price_per_night: MoneyFixtures::lodge_nightly(),
                total_rooms: 20,
                available_rooms: None,
                amenities: vec!["wifi".to_string(), "breakfast".to_string()],
                rating: None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.draft.name = name.into();
        self
    }

    pub fn lodge_type(mut self, lodge_type: impl Into<String>) -> Self {
        self.draft.lodge_type = lodge_type.into();
        self
    }

    pub fn price_per_night(mut self, price: Money) -> Self {
        self.draft.price_per_night = price;
        self
    }

    pub fn rooms(mut self, total: i64) -> Self {
        self.draft.total_rooms = total;
        self
    }

    pub fn available_rooms(mut self, available: i64) -> Self {
        self.draft.available_rooms = Some(available);
        self
    }

    pub fn location(mut self, location_id: LocationId) -> Self {
        self.draft.location_id = Some(location_id);
        self
    }

    pub fn rating(mut self, rating: Decimal) -> Self {
        self.draft.rating = Some(rating);
        self
    }

    pub fn build(self) -> LodgeDraft {
        self.draft
    }
}

/// Builder for [`TransportDraft`]
#[derive(Debug, Clone)]
pub struct TransportBuilder {
    draft: TransportDraft,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportBuilder {
    pub fn new() -> Self {
        Self {
            draft: TransportDraft {
                transport_type: "BUS".to_string(),
                provider: StringFixtures::provider().to_string(),
                vehicle_number: Some("GLT-1234".to_string()),
                from_location_id: None,
                to_location_id: None,
                cost: MoneyFixtures::transport_fare(),
                capacity: 40,
                available_seats: None,
            },
        }
    }

    pub fn transport_type(mut self, transport_type: impl Into<String>) -> Self {
        self.draft.transport_type = transport_type.into();
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.draft.provider = provider.into();
        self
    }

    pub fn route(mut self, from: LocationId, to: LocationId) -> Self {
        self.draft.from_location_id = Some(from);
        self.draft.to_location_id = Some(to);
        self
    }

    pub fn cost(mut self, cost: Money) -> Self {
        self.draft.cost = cost;
        self
    }

    pub fn seats(mut self, capacity: i64) -> Self {
        self.draft.capacity = capacity;
        self
    }

    pub fn available_seats(mut self, available: i64) -> Self {
        self.draft.available_seats = Some(available);
        self
    }

    pub fn build(self) -> TransportDraft {
        self.draft
    }
}

/// Builder for user registrations
#[derive(Debug, Clone)]
pub struct UserBuilder {
    user: NewUser,
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBuilder {
    /// A customer with a unique email
    pub fn new() -> Self {
        Self {
            user: NewUser::new("Ayesha Khan", StringFixtures::email(), UserRole::Customer),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.user.name = name.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.user.email = email.into();
        self
    }

    pub fn admin(mut self) -> Self {
        self.user.role = UserRole::Admin;
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.user.phone = Some(phone.into());
        self
    }

    pub fn build(self) -> NewUser {
        self.user
    }
}

/// Shorthand for a location in the default country
pub fn location(name: &str) -> LocationDraft {
    LocationDraft::new(name, StringFixtures::country())
}
