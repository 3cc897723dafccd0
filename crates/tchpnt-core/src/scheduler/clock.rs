//! Wall-clock sources for the day-boundary scheduler.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use std::sync::Mutex;
use std::time::Duration;

use crate::urgency::next_local_midnight;

/// Source of "now" for calendar-date decisions.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Time left until the next local midnight, if it can be determined.
    fn until_next_midnight(&self) -> Option<Duration>;
}

/// The host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn until_next_midnight(&self) -> Option<Duration> {
        let now = Local::now();
        let midnight = next_local_midnight(&now)?;
        (midnight - now).to_std().ok()
    }
}

/// A clock that only moves when told to, in a fixed UTC offset.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.lock();
        *now = *now + by;
    }

    fn current(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current().with_timezone(&Utc)
    }

    fn today(&self) -> NaiveDate {
        self.current().date_naive()
    }

    fn until_next_midnight(&self) -> Option<Duration> {
        let now = self.current();
        let midnight = next_local_midnight(&now)?;
        (midnight - now).to_std().ok()
    }
}
