//! Core error types for tchpnt-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! failures are raised before anything reaches a store; persistence failures
//! come back from the store and are surfaced after the caller's local view has
//! been rolled back.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tchpnt-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An action-flow operation was invoked in a state that does not allow it
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        state: &'static str,
        operation: &'static str,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// No record with the given id
    #[error("Touchpoint not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write
    #[error("Constraint violated: {0}")]
    Conflict(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable data directory
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// Cadence outside the accepted range
    #[error("cadence must be between {min} and {max} days, got {value}")]
    CadenceOutOfRange { value: i64, min: u32, max: u32 },

    /// Another touchpoint already uses this channel
    #[error("a touchpoint for channel '{0}' already exists")]
    DuplicateChannel(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) => match e.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    PersistenceError::Locked
                }
                rusqlite::ErrorCode::ConstraintViolation => PersistenceError::Conflict(
                    msg.clone().unwrap_or_else(|| e.to_string()),
                ),
                _ => PersistenceError::QueryFailed(err.to_string()),
            },
            _ => PersistenceError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Persistence(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
