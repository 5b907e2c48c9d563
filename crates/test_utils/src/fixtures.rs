//! Pre-built Test Fixtures
//!
//! Consistent, predictable values shared by builders and tests. The calendar
//! is pinned: "today" is 2026-01-10 and the default tour departs a month
//! later.

use chrono::{Duration, NaiveDate};
use core_kernel::{Currency, Money};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Default tour price per person
    pub fn tour_price() -> Money {
        Money::new(dec!(450.00), Currency::USD)
    }

    /// Default lodge price per night
    pub fn lodge_nightly() -> Money {
        Money::new(dec!(120.00), Currency::USD)
    }

    /// Default transport fare per seat
    pub fn transport_fare() -> Money {
        Money::new(dec!(35.00), Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// A EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for calendar data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The date every [`crate::TestWorld`] clock starts on
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    pub fn tour_start() -> NaiveDate {
        Self::today() + Duration::days(30)
    }

    pub fn tour_end() -> NaiveDate {
        Self::tour_start() + Duration::days(5)
    }

    /// A departure that has already happened
    pub fn past_start() -> NaiveDate {
        Self::today() - Duration::days(3)
    }
}

/// Fixture for string data
pub struct StringFixtures;

impl StringFixtures {
    pub fn tour_name() -> &'static str {
        "Fairy Meadows Trek"
    }

    pub fn lodge_name() -> &'static str {
        "Eagle's Nest Hotel"
    }

    pub fn provider() -> &'static str {
        "Northern Areas Transport"
    }

    pub fn country() -> &'static str {
        "Pakistan"
    }

    /// A unique, valid email address
    pub fn email() -> String {
        format!("traveller-{}@example.com", uuid::Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tour_dates_are_in_the_future() {
        assert!(TemporalFixtures::tour_start() > TemporalFixtures::today());
        assert!(TemporalFixtures::tour_end() > TemporalFixtures::tour_start());
        assert!(TemporalFixtures::past_start() < TemporalFixtures::today());
    }

    #[test]
    fn test_emails_are_unique() {
        assert_ne!(StringFixtures::email(), StringFixtures::email());
    }
}
