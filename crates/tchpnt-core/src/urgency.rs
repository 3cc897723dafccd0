//! Urgency calculation.
//!
//! Urgency is `days_elapsed - cadence_days`, where `days_elapsed` counts local
//! calendar dates, not 24-hour periods: contact at 23:00 checked at 01:00 the
//! next morning is one day elapsed. Everything here is pure and takes `now`
//! explicitly; the time zone of `now` is the zone used for calendar dates.

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a touchpoint stands relative to its cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    /// Contact is past due by this many days.
    Overdue { by_days: u32 },
    DueToday,
    /// Contact is due in this many days.
    DueIn { days: u32 },
}

impl Status {
    fn from_urgency(urgency_days: i64) -> Self {
        if urgency_days > 0 {
            Status::Overdue {
                by_days: clamp_u32(urgency_days),
            }
        } else if urgency_days == 0 {
            Status::DueToday
        } else {
            Status::DueIn {
                days: clamp_u32(-urgency_days),
            }
        }
    }

    /// Text shown next to the name.
    pub fn label(&self) -> String {
        match self {
            Status::Overdue { by_days: 1 } => "Overdue by 1 day".to_string(),
            Status::Overdue { by_days } => format!("Overdue by {by_days} days"),
            Status::DueToday => "Due today".to_string(),
            Status::DueIn { days: 1 } => "Due tomorrow".to_string(),
            Status::DueIn { days } => format!("Due in {days} days"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Presentation tier derived from urgency.
///
/// Three tiers: anything past due is `Overdue`, due today or tomorrow is
/// `DueSoon`, two or more days out is `OnTrack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    OnTrack,
    DueSoon,
    Overdue,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::OnTrack => "on_track",
            Severity::DueSoon => "due_soon",
            Severity::Overdue => "overdue",
        }
    }
}

/// Map urgency to a presentation tier.
pub fn severity(urgency_days: i64) -> Severity {
    match urgency_days {
        u if u > 0 => Severity::Overdue,
        -1 | 0 => Severity::DueSoon,
        _ => Severity::OnTrack,
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub urgency_days: i64,
    pub status: Status,
}

impl Classification {
    pub fn severity(&self) -> Severity {
        severity(self.urgency_days)
    }
}

/// Whole calendar days between the local date of `last_contact_at` and the
/// local date of `now`, in `now`'s time zone.
///
/// A last contact dated after `now` counts as contact today.
pub fn days_elapsed<Tz: TimeZone>(last_contact_at: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let last_date = last_contact_at.with_timezone(&now.timezone()).date_naive();
    let today = now.date_naive();
    (today - last_date).num_days().max(0)
}

/// Classify a touchpoint given its cadence and last contact.
pub fn classify<Tz: TimeZone>(
    cadence_days: u32,
    last_contact_at: &DateTime<Utc>,
    now: &DateTime<Tz>,
) -> Classification {
    let urgency_days = days_elapsed(last_contact_at, now) - cadence_days as i64;
    Classification {
        urgency_days,
        status: Status::from_urgency(urgency_days),
    }
}

/// Start of the calendar day after `now`, in `now`'s zone.
///
/// `None` when that local instant does not exist or the date overflows.
/// Where midnight is ambiguous (clocks rolled back) the earlier instant wins.
pub fn next_local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tomorrow = now.date_naive().checked_add_days(Days::new(1))?;
    now.timezone()
        .from_local_datetime(&tomorrow.and_time(NaiveTime::MIN))
        .earliest()
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
