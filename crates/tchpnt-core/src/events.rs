//! Change notifications that tell a presentation layer to re-rank.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::touchpoint::{PreferredAction, TouchpointId};

/// Every change that invalidates a rendered ranking produces an Event.
/// Presentation re-pulls and re-ranks when it receives one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TouchpointCreated {
        id: TouchpointId,
        name: String,
        at: DateTime<Utc>,
    },
    TouchpointReset {
        id: TouchpointId,
        at: DateTime<Utc>,
    },
    TouchpointDeleted {
        id: TouchpointId,
        at: DateTime<Utc>,
    },
    /// The local calendar date moved forward. A multi-day gap produces one
    /// event spanning the whole gap.
    DayChanged {
        from: NaiveDate,
        to: NaiveDate,
        at: DateTime<Utc>,
    },
    /// The preferred action was handed to the dispatcher.
    ActionDispatched {
        id: TouchpointId,
        action: PreferredAction,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether a rendered ranking is stale after this event.
    pub fn requires_refresh(&self) -> bool {
        !matches!(self, Event::ActionDispatched { .. })
    }
}

/// Receiver of `onRefreshNeeded` signals.
pub trait RefreshListener: Send + Sync {
    fn on_refresh_needed(&self, event: &Event);
}

impl<F> RefreshListener for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_refresh_needed(&self, event: &Event) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::DayChanged {
            from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DayChanged");
        assert_eq!(json["to"], "2025-01-04");
    }

    #[test]
    fn dispatch_does_not_require_refresh() {
        let dispatched = Event::ActionDispatched {
            id: "x".into(),
            action: PreferredAction::Call,
            at: Utc::now(),
        };
        assert!(!dispatched.requires_refresh());
        let reset = Event::TouchpointReset {
            id: "x".into(),
            at: Utc::now(),
        };
        assert!(reset.requires_refresh());
    }

    #[test]
    fn closures_are_listeners() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = AtomicUsize::new(0);
        let listener = |_: &Event| {
            count.fetch_add(1, Ordering::SeqCst);
        };
        listener.on_refresh_needed(&Event::TouchpointDeleted {
            id: "x".into(),
            at: Utc::now(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
