//! # Tchpnt Core Library
//!
//! Core logic for a personal "stay in touch" tracker. Each touchpoint is a
//! person with a contact cadence; the library tells you who is overdue, who
//! is due soon, and who can wait. The `tchpnt` CLI is a thin layer over the
//! same library.
//!
//! ## Architecture
//!
//! - **Urgency**: pure classification of one record against `now`, in
//!   whole local calendar days
//! - **Ranking**: most urgent first, stable tie-break by id
//! - **Service**: validation, snapshot, and writes with rollback
//! - **Scheduler**: a background task that signals once per new local day
//! - **Storage**: SQLite records and TOML configuration
//!
//! ## Key Components
//!
//! - [`TouchpointService`]: create, reset, delete, rank
//! - [`ActionFlow`]: dispatch an action, then confirm or cancel the reset
//! - [`DayBoundaryScheduler`]: re-rank signal at local midnight
//! - [`TouchpointDb`]: persistence
//! - [`Config`]: application configuration management

pub mod dispatch;
pub mod error;
pub mod events;
pub mod flow;
pub mod ranking;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod touchpoint;
pub mod urgency;

pub use dispatch::{ActionDispatcher, NoopDispatcher, RecordingDispatcher, UrlDispatcher};
pub use error::{ConfigError, CoreError, PersistenceError, ValidationError};
pub use events::{Event, RefreshListener};
pub use flow::{ActionFlow, FlowState};
pub use ranking::{rank, RankedTouchpoint};
pub use scheduler::{Clock, DayBoundaryScheduler, ManualClock, SchedulerConfig, SystemClock};
pub use service::TouchpointService;
pub use storage::{Config, MemoryStore, TouchpointDb, TouchpointStore};
pub use touchpoint::{
    CadencePreset, Category, PreferredAction, TouchpointDraft, TouchpointId, TouchpointRecord,
};
pub use urgency::{classify, Classification, Severity, Status};
