//! Custom error types for gateway and engine operations

use std::time::Duration;
use thiserror::Error;

/// Classified failure of a single translation engine call.
///
/// Only these two kinds exist so the orchestrator can decide whether falling
/// back is meaningful. Provider-specific status/body inspection happens in one
/// adapter function per engine and always lands here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Provider reported a rate limit or exhausted quota
    #[error("Engine quota exceeded")]
    QuotaExceeded,

    /// Transport failure, timeout, bad status or unusable reply
    #[error("Engine unavailable: {reason}")]
    Unavailable {
        reason: String,
    },
}

impl EngineError {
    /// Shorthand for an `Unavailable` error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        EngineError::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Gateway-level errors surfaced to the presentation layer
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Session used up its free allowance
    #[error("Free-tier limit reached. Quota resets in {}", format_reset(.reset_in))]
    QuotaExceeded {
        reset_in: Duration,
    },

    /// Both engines failed for this request
    #[error("Translation servers are currently busy. Please try again later")]
    Exhausted,

    /// Request rejected before reaching any engine
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
    },

    /// Language label or code not in the catalog
    #[error("Unknown language: {label}")]
    UnknownLanguage {
        label: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Configuration source could not be read or deserialized
    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Render a reset ETA as `Xh Ym`
pub fn format_reset(reset_in: &Duration) -> String {
    let secs = reset_in.as_secs();
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
