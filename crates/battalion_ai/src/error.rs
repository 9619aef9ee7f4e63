//! Error types for the decision layer.

use thiserror::Error;

/// Errors raised while configuring search.
#[derive(Debug, Error)]
pub enum AiError {
    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A RON configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
