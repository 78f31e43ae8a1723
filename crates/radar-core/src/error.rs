//! Error types for radar-core

use thiserror::Error;

/// Result type alias using radar-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration and catalog data
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
