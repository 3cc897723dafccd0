//! Touchpoint records: who to stay in touch with, how often, and how.
//!
//! A record is created from a validated [`TouchpointDraft`] and afterwards only
//! changes through a reset (new `last_contact_at`) or disappears through a
//! delete. Urgency is never stored; see [`crate::urgency`].

mod draft;

pub(crate) use draft::check_cadence;
pub use draft::{CadencePreset, TouchpointDraft, MAX_CADENCE_DAYS, MIN_CADENCE_DAYS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Opaque, immutable identifier assigned when a touchpoint is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TouchpointId(String);

impl TouchpointId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TouchpointId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TouchpointId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TouchpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the user prefers to reach this person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredAction {
    /// Text message to the channel.
    #[default]
    Message,
    /// Phone call to the channel.
    Call,
    /// In-person meeting; nothing is dispatched.
    MeetUp,
}

impl PreferredAction {
    /// Whether this action hands off to an external dispatcher.
    pub fn dispatches(&self) -> bool {
        match self {
            PreferredAction::Message | PreferredAction::Call => true,
            PreferredAction::MeetUp => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredAction::Message => "message",
            PreferredAction::Call => "call",
            PreferredAction::MeetUp => "meet_up",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            PreferredAction::Message => "Text",
            PreferredAction::Call => "Call",
            PreferredAction::MeetUp => "Meet Up",
        }
    }
}

impl fmt::Display for PreferredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PreferredAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "message" | "text" | "sms" => Ok(PreferredAction::Message),
            "call" | "phone" => Ok(PreferredAction::Call),
            "meetup" | "meet" => Ok(PreferredAction::MeetUp),
            _ => Err(ValidationError::InvalidValue {
                field: "preferred_action".into(),
                message: format!("unknown action '{s}' (expected message, call or meetup)"),
            }),
        }
    }
}

/// Optional grouping used for filtering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Personal,
    Business,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Business => "business",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "personal" => Ok(Category::Personal),
            "business" => Ok(Category::Business),
            _ => Err(ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown category '{s}' (expected personal or business)"),
            }),
        }
    }
}

/// A tracked person and the cadence at which to contact them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchpointRecord {
    /// Unique identifier
    pub id: TouchpointId,
    /// Display name
    pub name: String,
    /// External address (phone number, handle). Only the dispatcher reads it.
    pub channel: String,
    /// Target number of days between contacts, `1..=365`
    pub cadence_days: u32,
    /// When contact was last made; only the local calendar date matters
    pub last_contact_at: DateTime<Utc>,
    pub preferred_action: PreferredAction,
    #[serde(default)]
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
}

impl TouchpointRecord {
    /// Whether this record survives an optional category filter.
    pub fn matches_category(&self, filter: Option<Category>) -> bool {
        match filter {
            None => true,
            Some(category) => self.category == Some(category),
        }
    }
}
