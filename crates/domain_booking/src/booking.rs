//! Booking entity and its status machine
//!
//! ```text
//! PENDING ──confirm──▶ CONFIRMED
//!    │                    │
//!    └──cancel──▶ CANCELLED ◀──cancel──┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BookingId, Money, MoneyError, UserId};
use domain_catalog::ResourceRef;

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses in which the booking's quantity is deducted from inventory
    pub fn holds_inventory(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A reservation of `quantity` units of one resource by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub resource: ResourceRef,
    /// People, rooms or seats reserved
    pub quantity: u32,
    pub status: BookingStatus,
    /// Price of one unit when the booking was made
    pub unit_price: Money,
    /// `unit_price × quantity`
    pub total_amount: Money,
    pub special_requests: Option<String>,
    pub booking_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Booking {
    pub fn new(
        user_id: UserId,
        resource: ResourceRef,
        quantity: u32,
        unit_price: Money,
        special_requests: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            id: BookingId::new_v7(),
            user_id,
            resource,
            quantity,
            status: BookingStatus::Pending,
            unit_price,
            total_amount: unit_price.times(quantity)?,
            special_requests,
            booking_date: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Changes the quantity and recomputes the total at the booked unit price
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), MoneyError> {
        self.total_amount = self.unit_price.times(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn transition_to(&mut self, target: BookingStatus, at: DateTime<Utc>) -> Result<(), BookingError> {
        if !self.status.can_transition_to(target) {
            return Err(BookingError::InvalidTransition {
                booking_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = at;
        Ok(())
    }
}

/// Input for creating a booking
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: UserId,
    pub resource: ResourceRef,
    /// Validated to be > 0 before any inventory is touched
    pub quantity: i64,
    pub special_requests: Option<String>,
}

/// Input for modifying a pending booking
#[derive(Debug, Clone)]
pub struct BookingUpdate {
    pub quantity: i64,
    pub special_requests: Option<String>,
}
