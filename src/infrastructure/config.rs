//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory of the artifact repository
    pub base_directory: String,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_directory: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Builds a configuration from `ROWLINE_HOME` and `ROWLINE_LOG`,
    /// falling back to the defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_directory: std::env::var("ROWLINE_HOME").unwrap_or(defaults.base_directory),
            log_level: std::env::var("ROWLINE_LOG").unwrap_or(defaults.log_level),
        }
    }
}
