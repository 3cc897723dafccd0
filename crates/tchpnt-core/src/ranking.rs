//! Ordering touchpoints by urgency.
//!
//! Most overdue first; equal urgency falls back to id ascending so the same
//! snapshot always ranks the same way.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::touchpoint::{Category, TouchpointRecord};
use crate::urgency::{classify, Severity, Status};

/// A record together with its classification at a given instant.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTouchpoint<'a> {
    #[serde(flatten)]
    pub record: &'a TouchpointRecord,
    pub urgency_days: i64,
    pub status: Status,
    pub label: String,
    pub severity: Severity,
}

/// Rank `records` at `now`, keeping only those in `category` when given.
pub fn rank<'a, Tz, I>(
    records: I,
    now: &DateTime<Tz>,
    category: Option<Category>,
) -> Vec<RankedTouchpoint<'a>>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TouchpointRecord>,
{
    let mut ranked: Vec<RankedTouchpoint<'a>> = records
        .into_iter()
        .filter(|record| record.matches_category(category))
        .map(|record| {
            let c = classify(record.cadence_days, &record.last_contact_at, now);
            RankedTouchpoint {
                record,
                urgency_days: c.urgency_days,
                status: c.status,
                label: c.status.label(),
                severity: c.severity(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.urgency_days
            .cmp(&a.urgency_days)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    ranked
}
