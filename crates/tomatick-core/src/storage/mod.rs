mod config;
pub mod database;
pub mod memory;
pub mod persist;

pub use config::{AppConfig, NotificationsConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// Store key for the timer [`Settings`](crate::Settings) blob.
pub const SETTINGS_KEY: &str = "settings";
/// Store key for the persisted timer snapshot.
pub const TIMER_STATE_KEY: &str = "timer_state";
/// Store key for the daily ledger.
pub const DAILY_STATS_KEY: &str = "daily_stats";

/// Opaque key -> string store. Every blob the core persists goes through here.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Returns the tomatick data directory, creating it if needed.
///
/// `TOMATICK_DATA_DIR` wins when set. Otherwise `~/.config/tomatick`, or
/// `~/.config/tomatick-dev` with `TOMATICK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TOMATICK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(".config");
            let env = std::env::var("TOMATICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tomatick-dev")
            } else {
                base_dir.join("tomatick")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
