//! Interaction state machine for acting on one touchpoint.
//!
//! ```text
//! Idle ──invoke──▶ ActionPending ──dispatch──▶ ConfirmPending ──confirm──▶ Idle
//!   │                                               │
//!   │                                               └──cancel──▶ Idle
//!   └──request_delete──▶ DeletePending ──confirm_delete / cancel──▶ Idle
//! ```
//!
//! A store failure while confirming leaves the flow where it was so the
//! caller can retry or cancel.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::dispatch::ActionDispatcher;
use crate::error::{CoreError, Result};
use crate::events::{Event, RefreshListener};
use crate::service::TouchpointService;
use crate::storage::TouchpointStore;
use crate::touchpoint::{TouchpointId, TouchpointRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    ActionPending { id: TouchpointId },
    ConfirmPending { id: TouchpointId },
    DeletePending { id: TouchpointId },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::ActionPending { .. } => "action_pending",
            FlowState::ConfirmPending { .. } => "confirm_pending",
            FlowState::DeletePending { .. } => "delete_pending",
        }
    }
}

pub struct ActionFlow<D: ActionDispatcher> {
    dispatcher: D,
    state: FlowState,
    prompt_after_dispatch: bool,
    listener: Option<Arc<dyn RefreshListener>>,
}

impl<D: ActionDispatcher> ActionFlow<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher,
            state: FlowState::Idle,
            prompt_after_dispatch: true,
            listener: None,
        }
    }

    /// When false, a Message/Call dispatch returns straight to Idle.
    pub fn with_prompt_after_dispatch(mut self, prompt: bool) -> Self {
        self.prompt_after_dispatch = prompt;
        self
    }

    /// Receive `ActionDispatched` events.
    pub fn with_listener(mut self, listener: Arc<dyn RefreshListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Run the record's preferred action.
    ///
    /// Returns `true` when a reset confirmation is now pending.
    pub fn invoke(&mut self, record: &TouchpointRecord) -> Result<bool> {
        self.require_idle("invoke an action")?;
        self.state = FlowState::ActionPending {
            id: record.id.clone(),
        };

        let action = record.preferred_action;
        if action.dispatches() {
            self.dispatcher.dispatch(&record.channel, action);
            info!(id = %record.id, action = action.as_str(), "action dispatched");
            if let Some(listener) = &self.listener {
                listener.on_refresh_needed(&Event::ActionDispatched {
                    id: record.id.clone(),
                    action,
                    at: Utc::now(),
                });
            }
            if !self.prompt_after_dispatch {
                self.state = FlowState::Idle;
                return Ok(false);
            }
        }

        self.state = FlowState::ConfirmPending {
            id: record.id.clone(),
        };
        Ok(true)
    }

    /// Reset the pending touchpoint's last contact to `now`.
    pub fn confirm_reset<S: TouchpointStore>(
        &mut self,
        service: &mut TouchpointService<S>,
        now: DateTime<Utc>,
    ) -> Result<TouchpointRecord> {
        let FlowState::ConfirmPending { id } = &self.state else {
            return Err(self.invalid("confirm a reset"));
        };
        let record = service.reset(id, now)?;
        self.state = FlowState::Idle;
        Ok(record)
    }

    pub fn request_delete(&mut self, record: &TouchpointRecord) -> Result<()> {
        self.require_idle("request a delete")?;
        self.state = FlowState::DeletePending {
            id: record.id.clone(),
        };
        Ok(())
    }

    pub fn confirm_delete<S: TouchpointStore>(
        &mut self,
        service: &mut TouchpointService<S>,
    ) -> Result<TouchpointRecord> {
        let FlowState::DeletePending { id } = &self.state else {
            return Err(self.invalid("confirm a delete"));
        };
        let record = service.delete(id)?;
        self.state = FlowState::Idle;
        Ok(record)
    }

    /// Decline whatever is pending. Returns the abandoned state.
    pub fn cancel(&mut self) -> FlowState {
        std::mem::replace(&mut self.state, FlowState::Idle)
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        match self.state {
            FlowState::Idle => Ok(()),
            _ => Err(self.invalid(operation)),
        }
    }

    fn invalid(&self, operation: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            state: self.state.name(),
            operation,
        }
    }
}
