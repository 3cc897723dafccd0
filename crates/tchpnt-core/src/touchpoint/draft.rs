//! Validated input for creating a touchpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Category, PreferredAction, TouchpointId, TouchpointRecord};
use crate::error::ValidationError;

pub const MIN_CADENCE_DAYS: u32 = 1;
pub const MAX_CADENCE_DAYS: u32 = 365;

/// Cadence choices offered when creating a touchpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadencePreset {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Custom(u32),
}

impl CadencePreset {
    pub fn days(&self) -> u32 {
        match self {
            CadencePreset::Daily => 1,
            CadencePreset::Weekly => 7,
            CadencePreset::Monthly => 30,
            CadencePreset::Custom(days) => *days,
        }
    }
}

impl fmt::Display for CadencePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CadencePreset::Daily => f.write_str("daily"),
            CadencePreset::Weekly => f.write_str("weekly"),
            CadencePreset::Monthly => f.write_str("monthly"),
            CadencePreset::Custom(days) => write!(f, "every {days} days"),
        }
    }
}

impl FromStr for CadencePreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "daily" => return Ok(CadencePreset::Daily),
            "weekly" => return Ok(CadencePreset::Weekly),
            "monthly" => return Ok(CadencePreset::Monthly),
            _ => {}
        }
        let days: i64 = trimmed.parse().map_err(|_| ValidationError::InvalidValue {
            field: "cadence".into(),
            message: format!("'{s}' is not daily, weekly, monthly or a number of days"),
        })?;
        check_cadence(days).map(CadencePreset::Custom)
    }
}

/// Reject cadences outside `MIN_CADENCE_DAYS..=MAX_CADENCE_DAYS`.
pub(crate) fn check_cadence(days: i64) -> Result<u32, ValidationError> {
    if days < MIN_CADENCE_DAYS as i64 || days > MAX_CADENCE_DAYS as i64 {
        return Err(ValidationError::CadenceOutOfRange {
            value: days,
            min: MIN_CADENCE_DAYS,
            max: MAX_CADENCE_DAYS,
        });
    }
    Ok(days as u32)
}

/// Everything the user supplies when saving a new touchpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchpointDraft {
    pub name: String,
    pub channel: String,
    pub cadence_days: u32,
    pub preferred_action: PreferredAction,
    #[serde(default)]
    pub category: Option<Category>,
    /// Defaults to the creation instant when absent.
    #[serde(default)]
    pub last_contact_at: Option<DateTime<Utc>>,
}

impl TouchpointDraft {
    pub fn new(
        name: impl Into<String>,
        channel: impl Into<String>,
        cadence_days: u32,
        preferred_action: PreferredAction,
    ) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            cadence_days,
            preferred_action,
            category: None,
            last_contact_at: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_last_contact_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_contact_at = Some(at);
        self
    }

    /// Check field-level rules. Duplicate channels are checked by the
    /// service, which knows the other records.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        if self.channel.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "channel" });
        }
        check_cadence(self.cadence_days as i64)?;
        Ok(())
    }

    /// Validate and turn into a record with a fresh id.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<TouchpointRecord, ValidationError> {
        self.validate()?;
        Ok(TouchpointRecord {
            id: TouchpointId::generate(),
            name: self.name.trim().to_string(),
            channel: self.channel.trim().to_string(),
            cadence_days: self.cadence_days,
            last_contact_at: self.last_contact_at.unwrap_or(now),
            preferred_action: self.preferred_action,
            category: self.category,
            created_at: now,
        })
    }
}
