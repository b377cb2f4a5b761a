//! Configuration management for case-assist
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, then an environment-specific file)
//! - Environment variables (`CASE_ASSIST_` prefix, `__` separator)
//!
//! Defaults come from the centralized `constants` module so the settings
//! layer and the engine defaults cannot drift apart.

pub mod constants;
pub mod settings;

pub use settings::{load_settings, KnowledgeSettings, RetrievalSettings, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
