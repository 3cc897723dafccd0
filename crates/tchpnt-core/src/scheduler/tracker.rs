//! Last-fired calendar date with compare-and-swap advancement.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, Ordering};

/// A forward move of the calendar date observed by one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTransition {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DayTransition {
    /// Number of calendar days covered (1 for a plain midnight crossing).
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}

/// Holds `lastFiredCalendarDate` as days since the common era.
///
/// [`DayTracker::advance_to`] is the only writer; comparing and storing happen
/// in one atomic step so concurrent checks cannot both claim a transition.
#[derive(Debug)]
pub struct DayTracker {
    last_fired: AtomicI32,
}

impl DayTracker {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            last_fired: AtomicI32::new(today.num_days_from_ce()),
        }
    }

    pub fn last_fired(&self) -> NaiveDate {
        from_ce(self.last_fired.load(Ordering::Acquire))
    }

    /// Move the date forward to `today`. Returns the transition when this call
    /// made the move, `None` when `today` is not after the stored date.
    pub fn advance_to(&self, today: NaiveDate) -> Option<DayTransition> {
        let target = today.num_days_from_ce();
        let mut current = self.last_fired.load(Ordering::Acquire);
        loop {
            if target <= current {
                return None;
            }
            match self.last_fired.compare_exchange(
                current,
                target,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => {
                    return Some(DayTransition {
                        from: from_ce(previous),
                        to: today,
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }
}

fn from_ce(days: i32) -> NaiveDate {
    // Only ever stores values produced by `num_days_from_ce`.
    NaiveDate::from_num_days_from_ce_opt(days).unwrap_or(NaiveDate::MIN)
}
