//! Error types for core step handling

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while decoding persisted steps
#[derive(Debug, Error)]
pub enum CoreError {
    /// The `type` discriminant does not name a registered step type
    #[error("Unknown step type: {0}")]
    UnknownStepType(String),

    /// A step object has no `type` discriminant
    #[error("Step is missing its 'type' field")]
    MissingStepType,

    /// The step payload does not match its declared type
    #[error("Invalid '{kind}' step: {source}")]
    InvalidStep {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// The input is not valid JSON
    #[error("Failed to parse steps: {0}")]
    Parse(#[from] serde_json::Error),
}
