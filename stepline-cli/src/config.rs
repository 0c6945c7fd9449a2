//! Configuration module
//!
//! Handles CLI configuration: the queue API location, credentials and the
//! runner selection file.

use std::path::PathBuf;

use stepline_client::{FileRunnerStore, QueueClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the queue API
    pub api_url: String,

    /// Optional bearer token
    pub token: Option<String>,

    /// Path of the runner selection file
    pub runner_store: PathBuf,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        Ok(())
    }

    pub fn client(&self) -> QueueClient {
        let client = QueueClient::new(&self.api_url);
        match &self.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }

    pub fn runners(&self) -> FileRunnerStore {
        FileRunnerStore::new(&self.runner_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> Config {
        Config {
            api_url: url.to_string(),
            token: None,
            runner_store: PathBuf::from("runners.json"),
        }
    }

    #[test]
    fn test_validate() {
        assert!(config("http://localhost:8090").validate().is_ok());
        assert!(config("https://queue.example.com").validate().is_ok());
        assert!(config("").validate().is_err());
        assert!(config("localhost:8090").validate().is_err());
    }

    #[test]
    fn test_client_uses_api_url() {
        assert_eq!(
            config("http://localhost:8090/").client().base_url(),
            "http://localhost:8090"
        );
    }
}
