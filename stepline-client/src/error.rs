//! Error types for the Stepline client

use stepline_compiler::CompileError;
use stepline_core::domain::ticket::TicketStatus;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Shown when a rejected enqueue carries no message
pub const ENQUEUE_FALLBACK_MESSAGE: &str = "Failed to enqueue pipeline";

/// Shown when a rejected cancellation carries no message
pub const CANCEL_FALLBACK_MESSAGE: &str = "Failed to cancel pipeline execution";

/// Errors that can occur when using the Stepline client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The queue answered an enqueue with a status other than queued, starting or running
    #[error("Enqueue rejected with status {status}: {}", .message.as_deref().unwrap_or(ENQUEUE_FALLBACK_MESSAGE))]
    EnqueueRejected {
        status: TicketStatus,
        message: Option<String>,
    },

    /// The queue answered a cancellation with a status other than canceled
    #[error("Cancel rejected with status {status}: {}", .message.as_deref().unwrap_or(CANCEL_FALLBACK_MESSAGE))]
    CancelRejected {
        status: TicketStatus,
        message: Option<String>,
    },

    /// The pipeline needs a global runner and none is stored for it
    #[error("No runner selected for pipeline {0}")]
    MissingGlobalRunner(String),

    /// Invalid request, rejected before reaching the network
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Polling gave up; the pipeline may still start later
    #[error("Stopped waiting after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// A poll loop for this pipeline is already running
    #[error("Pipeline {0} is already being watched")]
    AlreadyWatching(String),

    /// The definition could not be serialized
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The runner store could not be read or written
    #[error("Runner store error: {0}")]
    Store(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
            || matches!(
                self,
                Self::EnqueueRejected {
                    status: TicketStatus::NotFound,
                    ..
                }
            )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Text for inline feedback: the server's message when it sent one,
    /// otherwise a fixed fallback per failure kind
    pub fn user_message(&self) -> String {
        match self {
            Self::EnqueueRejected { message, .. } => message
                .clone()
                .unwrap_or_else(|| ENQUEUE_FALLBACK_MESSAGE.to_string()),
            Self::CancelRejected { message, .. } => message
                .clone()
                .unwrap_or_else(|| CANCEL_FALLBACK_MESSAGE.to_string()),
            Self::MissingGlobalRunner(_) => {
                "Select a runner for this pipeline before running it".to_string()
            }
            Self::Timeout { .. } => {
                "Stopped waiting for a runner; the pipeline may still start".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = ClientError::EnqueueRejected {
            status: TicketStatus::Failed,
            message: Some("no runner available".to_string()),
        };
        assert_eq!(err.user_message(), "no runner available");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = ClientError::CancelRejected {
            status: TicketStatus::Running,
            message: None,
        };
        assert_eq!(err.user_message(), CANCEL_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_timeout_message_differs_from_failure() {
        let timeout = ClientError::Timeout { attempts: 600 };
        let failure = ClientError::EnqueueRejected {
            status: TicketStatus::Failed,
            message: None,
        };
        assert!(timeout.is_timeout());
        assert_ne!(timeout.user_message(), failure.user_message());
    }
}
