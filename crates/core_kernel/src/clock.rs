//! Time source abstraction
//!
//! Services never call `Utc::now()` directly. Tour expiry, booking dates and
//! payment timestamps all read from a [`Clock`] so tests can pin the calendar.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::RwLock;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for date-only comparisons such as tour expiry
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant that tests may move
#[derive(Debug)]
pub struct FixedClock {
    time: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: RwLock::new(time),
        }
    }

    /// Pins the clock to midnight UTC on `date`
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn set(&self, time: DateTime<Utc>) {
        match self.time.write() {
            Ok(mut guard) => *guard = time,
            Err(poisoned) => *poisoned.into_inner() = time,
        }
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now() + by;
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.time.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
