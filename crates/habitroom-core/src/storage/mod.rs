mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, QueriesConfig, RankingConfig, UserConfig};
pub use database::{HabitDb, User};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the habitroom data directory, creating it if needed.
///
/// `HABITROOM_DATA_DIR` wins when set. Otherwise `~/.config/habitroom[-dev]/`
/// is chosen by `HABITROOM_ENV` (set `HABITROOM_ENV=dev` for the development
/// directory).
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HABITROOM_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .ok_or_else(|| ConfigError::DataDir("home directory not found".into()))?
                .join(".config");

            let env = std::env::var("HABITROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitroom-dev")
            } else {
                base_dir.join("habitroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
