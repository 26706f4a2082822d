//! Error types for promptboard-core

use std::time::Duration;

use thiserror::Error;

/// Result type alias using promptboard-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in promptboard-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote store rejected or failed a request
    #[error("Remote store error: {0}")]
    Remote(String),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt not found
    #[error("Prompt not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote call did not answer within the ceiling
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Subscription ended or was torn down
    #[error("Subscription closed")]
    SubscriptionClosed,

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
