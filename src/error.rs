//! Error types for nova.

use std::io;
use thiserror::Error;

/// Result type alias for nova operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nova operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Transport or HTTP status error from the completion endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Completion endpoint answered with an unexpected body.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Key not usable by a storage backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad user input (empty turn, unknown command argument, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
