//! Stepline HTTP Client
//!
//! A type-safe client for the pipeline queue API: submitting compiled
//! pipelines, tracking their tickets, cancelling them, and reading the
//! execution history.
//!
//! # Example
//!
//! ```no_run
//! use stepline_client::{MemoryRunnerStore, QueueClient, RunnerStore};
//! use stepline_compiler::from_yaml;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = QueueClient::new("http://localhost:8090");
//!     let runners = MemoryRunnerStore::default();
//!     runners.set_runner("pipeline-1", "acme/runners/pixel-8")?;
//!
//!     let definition = from_yaml(&std::fs::read_to_string("pipeline.yaml")?)?;
//!     let ticket = client.enqueue("pipeline-1", &definition, &runners).await?;
//!
//!     println!("Queued at position {}", ticket.display_position());
//!     Ok(())
//! }
//! ```

pub mod error;
mod executions;
pub mod poller;
mod queue;
pub mod runner_store;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use poller::{PollConfig, TicketPoller};
pub use queue::resolve_global_runner;
pub use runner_store::{FileRunnerStore, MemoryRunnerStore, RunnerStore};

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the pipeline queue API
///
/// Methods are organized into logical groups:
/// - Queue (enqueue, cancel)
/// - Execution history (workflows, results)
#[derive(Debug, Clone)]
pub struct QueueClient {
    /// Base URL of the API (e.g., "http://localhost:8090")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Bearer token sent with every request
    token: Option<String>,
}

impl QueueClient {
    /// Create a new queue client
    ///
    /// # Example
    /// ```
    /// use stepline_client::QueueClient;
    ///
    /// let client = QueueClient::new("http://localhost:8090");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new queue client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended with `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("Base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Returns an error for non-2xx statuses, otherwise the decoded body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
