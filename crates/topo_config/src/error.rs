//! Error types for the config module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading stack configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Stack file not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing required config key: {0}")]
    MissingKey(String),

    #[error("Failed to decode config key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: String, name: String },

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Whether this is a decode failure on a single key.
    pub fn is_decode(&self) -> bool {
        matches!(self, ConfigError::Decode { .. })
    }
}
