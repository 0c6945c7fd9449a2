//! Ticket poller
//!
//! Re-submits a pipeline on a fixed interval until its ticket reaches a
//! runner. The queue treats a repeated enqueue of the same pipeline as a
//! status query, so polling and submitting are the same request.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use stepline_core::domain::pipeline::PipelineDefinition;
use stepline_core::domain::ticket::QueueTicket;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::QueueClient;
use crate::error::{ClientError, Result};
use crate::runner_store::RunnerStore;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_ATTEMPTS: u32 = 600;

/// Poll loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two enqueue requests
    pub interval: Duration,

    /// Requests sent before giving up with `Timeout`
    pub max_attempts: u32,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - POLL_INTERVAL_MS (optional, milliseconds, default: 500)
    /// - POLL_MAX_ATTEMPTS (optional, default: 600)
    pub fn from_env() -> anyhow::Result<Self> {
        let interval = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);

        let max_attempts = std::env::var("POLL_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let config = Self::new(interval, max_attempts);
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            anyhow::bail!("poll interval must be greater than 0");
        }

        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        Ok(())
    }

    /// Upper bound of time spent waiting
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Watches queued pipelines until a runner picks them up
///
/// At most one watch per pipeline id runs at a time.
pub struct TicketPoller {
    client: Arc<QueueClient>,
    config: PollConfig,
    active: Mutex<HashSet<String>>,
}

impl TicketPoller {
    pub fn new(client: Arc<QueueClient>, config: PollConfig) -> Self {
        Self {
            client,
            config,
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn is_watching(&self, pipeline_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(pipeline_id)
    }

    /// Submit the pipeline and wait until its ticket is running
    pub async fn watch(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
        runners: &dyn RunnerStore,
    ) -> Result<QueueTicket> {
        self.watch_with(pipeline_id, definition, runners, |_| {})
            .await
    }

    /// Like [`watch`](Self::watch), reporting every intermediate ticket
    ///
    /// # Errors
    /// - `AlreadyWatching` if another watch of `pipeline_id` is in progress
    /// - any enqueue error, which ends the loop immediately
    /// - `Timeout` once `max_attempts` requests went by without a running ticket
    pub async fn watch_with<F>(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
        runners: &dyn RunnerStore,
        mut on_update: F,
    ) -> Result<QueueTicket>
    where
        F: FnMut(&QueueTicket),
    {
        let _guard = WatchGuard::acquire(&self.active, pipeline_id)?;

        // Resolved once; every attempt sends the same text
        let yaml = self.client.prepare(pipeline_id, definition, runners)?;

        info!(
            "Watching pipeline {} (interval: {:?}, attempts: {})",
            pipeline_id, self.config.interval, self.config.max_attempts
        );

        let mut interval = time::interval(self.config.interval.max(Duration::from_millis(1)));
        // A slow response must not be followed by a burst of catch-up requests
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.config.max_attempts {
            interval.tick().await;

            let ticket = self.client.enqueue_yaml(pipeline_id, yaml.as_str()).await?;
            on_update(&ticket);

            if ticket.status.is_running_or_later() || ticket.execution_started() {
                info!(
                    "Pipeline {} is {} after {} attempt(s)",
                    pipeline_id, ticket.status, attempt
                );
                return Ok(ticket);
            }

            debug!(
                "Pipeline {} still {} at position {}/{}",
                pipeline_id,
                ticket.status,
                ticket.display_position(),
                ticket.line_len
            );
        }

        warn!(
            "Gave up waiting for pipeline {} after {} attempt(s)",
            pipeline_id, self.config.max_attempts
        );
        Err(ClientError::Timeout {
            attempts: self.config.max_attempts,
        })
    }
}

/// Marks a pipeline as watched until dropped
struct WatchGuard<'a> {
    active: &'a Mutex<HashSet<String>>,
    pipeline_id: String,
}

impl<'a> WatchGuard<'a> {
    fn acquire(active: &'a Mutex<HashSet<String>>, pipeline_id: &str) -> Result<Self> {
        let mut set = active.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(pipeline_id.to_string()) {
            return Err(ClientError::AlreadyWatching(pipeline_id.to_string()));
        }
        Ok(Self {
            active,
            pipeline_id: pipeline_id.to_string(),
        })
    }
}

impl Drop for WatchGuard<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.pipeline_id);
    }
}
