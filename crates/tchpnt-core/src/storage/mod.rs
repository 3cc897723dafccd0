//! Persistence: SQLite and in-memory touchpoint stores, configuration, data directory.

mod config;
pub mod database;
mod memory;
pub mod migrations;
mod store;

pub use config::{Config, DispatchConfig, TouchpointDefaults};
pub use database::TouchpointDb;
pub use memory::MemoryStore;
pub use store::TouchpointStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `TCHPNT_DATA_DIR` wins when set. Otherwise `~/.config/tchpnt[-dev]/`,
/// with the `-dev` suffix when `TCHPNT_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TCHPNT_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TCHPNT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tchpnt-dev")
            } else {
                base_dir.join("tchpnt")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
