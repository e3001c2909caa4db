mod config;
mod store;

pub use config::{ConfigKey, ConfigPatch, Configuration};
pub use store::{ConfigPersistence, ConfigStore, JsonFileStore, MemoryStore, CONFIG_KEY};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the directory holding persisted state.
///
/// `POMOTICK_DATA_DIR` wins when set. Otherwise `~/.config/pomotick[-dev]/`
/// based on `POMOTICK_ENV` (set it to `dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("POMOTICK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOTICK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomotick-dev")
            } else {
                base_dir.join("pomotick")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
