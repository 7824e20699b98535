//! Application configuration, confy-backed.
//!
//! The CLI loads this once and passes values down; the pipeline itself
//! never reads config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_NAME: &str = "chronicle";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the sqlite database.
    pub database_path: PathBuf,
    /// Directory scanned for save archives when no explicit paths are
    /// given to the ingest command.
    pub saves_directory: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("chronicle.sqlite"),
            saves_directory: PathBuf::from("saves"),
        }
    }
}

/// Load the config, falling back to defaults when missing or invalid.
pub fn load_config() -> AppConfig {
    match confy::load(APP_NAME, None) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            AppConfig::default()
        }
    }
}

/// Persist the config.
pub fn save_config(config: &AppConfig) -> Result<(), confy::ConfyError> {
    confy::store(APP_NAME, None, config)
}
