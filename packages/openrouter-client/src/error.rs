//! OpenRouter client error types.

use std::time::Duration;

/// Errors returned by the OpenRouter client.
#[derive(Debug, thiserror::Error)]
pub enum OpenRouterError {
    /// Client misconfiguration (missing API key, bad base URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure (DNS, connection, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The API returned a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, OpenRouterError>;
