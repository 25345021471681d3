//! Application configuration.
//!
//! Values come from `config.toml`, then the environment (including `.env`),
//! then built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::srs::SchedulerConfig;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "config.toml";

/// Database used when neither config.toml nor DATABASE_PATH names one
pub const DEFAULT_DATABASE_PATH: &str = "data/flashcards.db";

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

/// Parse a config file. A missing file yields the empty config; a file that
/// exists but cannot be read or parsed is an error.
pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Scheduler tunables from `[scheduler]`, validated. Defaults when absent.
pub fn load_scheduler_config(path: &Path) -> Result<SchedulerConfig> {
    let config = load_app_config(path)?.scheduler.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    database_path_from(Path::new(CONFIG_FILE))
}

pub fn database_path_from(config_path: &Path) -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    match load_app_config(config_path) {
        Ok(config) => {
            if let Some(path) = config.database.and_then(|db| db.path) {
                tracing::info!("Using database from {}: {}", config_path.display(), path);
                return PathBuf::from(path);
            }
        }
        Err(e) => tracing::warn!("Ignoring unreadable config: {}", e),
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(DEFAULT_DATABASE_PATH);
    tracing::info!("Using default database path: {}", default.display());
    default
}
