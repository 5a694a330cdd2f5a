//! Error types for PodEcho.

use crate::services::ServiceError;
use thiserror::Error;

/// Library-level error type for PodEcho operations.
#[derive(Error, Debug)]
pub enum PodEchoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for PodEcho operations.
pub type Result<T> = std::result::Result<T, PodEchoError>;
