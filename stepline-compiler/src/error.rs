//! Compilation errors
//!
//! Every variant aborts compilation; no partially linked pipeline is ever
//! returned. An unresolved deep-link placeholder is not an error.

use stepline_core::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Persisted steps could not be decoded (unknown type, bad payload)
    #[error(transparent)]
    Step(#[from] CoreError),

    /// A step lost the catalog entity it points at
    #[error("Step '{step_id}' is missing its {field}")]
    MissingReference { step_id: String, field: &'static str },

    #[error("Pipeline has no steps")]
    EmptyPipeline,

    #[error("Failed to encode pipeline definition: {0}")]
    Encode(#[source] serde_yaml::Error),

    #[error("Failed to parse pipeline definition: {0}")]
    Decode(#[source] serde_yaml::Error),
}
