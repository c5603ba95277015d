//! Error types for recency-cache.

use thiserror::Error;

/// Standard result type for recency-cache.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised at the crate's configuration and scripting surfaces.
///
/// The cache itself never fails: absent keys are `None` and `put` always
/// succeeds. Everything here originates from construction or I/O.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("Configuration not found at: {0}")]
    ConfigNotFound(String),
}

impl CacheError {
    /// Creates an invalid-configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a script error for the given 1-based line number.
    pub fn script<S: Into<String>>(line: usize, msg: S) -> Self {
        Self::Script {
            line,
            message: msg.into(),
        }
    }
}
