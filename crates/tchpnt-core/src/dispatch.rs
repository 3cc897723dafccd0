//! Hand-off of a preferred action to whatever the OS uses for texts and calls.
//!
//! Dispatch is fire-and-forget. A dispatcher reports failures through the log
//! and never blocks or fails the caller.

use std::sync::Mutex;
use tracing::{debug, warn};

use crate::touchpoint::PreferredAction;

pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, channel: &str, action: PreferredAction);
}

/// Build the URL an OS handler understands for `action`.
///
/// Returns `None` for actions that have nothing to dispatch.
pub fn action_url(channel: &str, action: PreferredAction) -> Option<String> {
    let scheme = match action {
        PreferredAction::Message => "sms",
        PreferredAction::Call => "tel",
        PreferredAction::MeetUp => return None,
    };
    let address: String = channel
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect();
    if address.is_empty() {
        return None;
    }
    Some(format!("{scheme}:{address}"))
}

/// Opens `sms:` / `tel:` URLs with the system handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlDispatcher;

impl ActionDispatcher for UrlDispatcher {
    fn dispatch(&self, channel: &str, action: PreferredAction) {
        let Some(url) = action_url(channel, action) else {
            debug!(action = action.as_str(), "nothing to dispatch");
            return;
        };
        match open::that_detached(&url) {
            Ok(()) => debug!(%url, "dispatched"),
            Err(e) => warn!(%url, error = %e, "failed to open action handler"),
        }
    }
}

/// Drops every action. Used when dispatch is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl ActionDispatcher for NoopDispatcher {
    fn dispatch(&self, channel: &str, action: PreferredAction) {
        debug!(channel, action = action.as_str(), "dispatch disabled");
    }
}

/// Remembers every dispatch instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(String, PreferredAction)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, PreferredAction)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&self, channel: &str, action: PreferredAction) {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((channel.to_string(), action));
    }
}

impl<D: ActionDispatcher + ?Sized> ActionDispatcher for Box<D> {
    fn dispatch(&self, channel: &str, action: PreferredAction) {
        (**self).dispatch(channel, action)
    }
}

impl<D: ActionDispatcher + ?Sized> ActionDispatcher for std::sync::Arc<D> {
    fn dispatch(&self, channel: &str, action: PreferredAction) {
        (**self).dispatch(channel, action)
    }
}
