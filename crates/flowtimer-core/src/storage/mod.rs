mod config;
pub mod database;
pub mod memory;

pub use config::{
    BreakPolicyKind, Config, NotificationsConfig, PomodoroConfig, TasksConfig, TimerConfig,
    TimerModeSetting, ALLOWED_BREAK_PERCENTAGES,
};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Durable key-value storage for JSON records.
///
/// Writes are synchronous; a successful `set` is durable when it returns.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Opaque change counter. Observers compare successive values to learn
    /// that another writer touched the store.
    fn version(&self) -> Result<u64, StorageError>;
}

/// Returns the data directory, creating it if needed.
///
/// `FLOWTIMER_DATA_DIR` overrides the location. Otherwise the directory is
/// `~/.config/flowtimer[-dev]/`, with `FLOWTIMER_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FLOWTIMER_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FLOWTIMER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("flowtimer-dev")
            } else {
                base_dir.join("flowtimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
