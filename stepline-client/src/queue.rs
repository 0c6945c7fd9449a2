//! Queue API endpoints

use std::borrow::Cow;
use tracing::{info, warn};

use stepline_core::domain::pipeline::PipelineDefinition;
use stepline_core::domain::ticket::{QueueTicket, TicketStatus};
use stepline_core::dto::queue::{CancelQuery, EnqueueRequest};

use crate::QueueClient;
use crate::error::{ClientError, Result};
use crate::runner_store::RunnerStore;

/// Inject the stored global runner when the pipeline needs one
///
/// Pipelines whose mobile-automation steps all carry their own runner are
/// returned unchanged.
///
/// # Errors
/// `MissingGlobalRunner` if a runner is needed and none is stored for
/// `pipeline_id`.
pub fn resolve_global_runner<'a>(
    pipeline_id: &str,
    definition: &'a PipelineDefinition,
    runners: &dyn RunnerStore,
) -> Result<Cow<'a, PipelineDefinition>> {
    if !definition.requires_global_runner() {
        return Ok(Cow::Borrowed(definition));
    }

    match runners.runner_for(pipeline_id)? {
        Some(runner) => Ok(Cow::Owned(definition.with_global_runner(runner))),
        None => Err(ClientError::MissingGlobalRunner(pipeline_id.to_string())),
    }
}

impl QueueClient {
    // =============================================================================
    // Queue
    // =============================================================================

    /// Submit a compiled pipeline for execution
    ///
    /// Resolves the global runner first; nothing is sent when it is missing.
    ///
    /// # Returns
    /// The ticket, if the queue accepted the pipeline (queued, starting or running)
    pub async fn enqueue(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
        runners: &dyn RunnerStore,
    ) -> Result<QueueTicket> {
        let yaml = self.prepare(pipeline_id, definition, runners)?;
        self.enqueue_yaml(pipeline_id, yaml).await
    }

    /// Resolve the runner and serialize the definition for submission
    pub(crate) fn prepare(
        &self,
        pipeline_id: &str,
        definition: &PipelineDefinition,
        runners: &dyn RunnerStore,
    ) -> Result<String> {
        let definition = resolve_global_runner(pipeline_id, definition, runners)?;
        Ok(stepline_compiler::to_yaml(&definition)?)
    }

    /// Submit already serialized definition text
    pub async fn enqueue_yaml(
        &self,
        pipeline_identifier: &str,
        yaml: impl Into<String>,
    ) -> Result<QueueTicket> {
        let url = self.endpoint(&["api", "pipeline", "queue"])?;
        let request = EnqueueRequest {
            pipeline_identifier: pipeline_identifier.to_string(),
            yaml: yaml.into(),
        };
        let response = self
            .authorize(self.client.post(url))
            .json(&request)
            .send()
            .await?;

        let ticket: QueueTicket = self.handle_response(response).await?;

        if !ticket.status.is_accepted() {
            warn!(
                "Enqueue of {} rejected with status {}",
                pipeline_identifier, ticket.status
            );
            return Err(ClientError::EnqueueRejected {
                status: ticket.status,
                message: ticket.error_message,
            });
        }

        info!(
            "Pipeline {} ticket {} is {} ({}/{})",
            pipeline_identifier,
            ticket.ticket_id,
            ticket.status,
            ticket.display_position(),
            ticket.line_len
        );
        Ok(ticket)
    }

    /// Cancel a ticket, releasing every runner assigned to it
    ///
    /// The server cannot infer which runners to release, so the full set
    /// must be given; an empty set is rejected before any request.
    pub async fn cancel(&self, ticket_id: &str, runner_ids: &[String]) -> Result<QueueTicket> {
        if ticket_id.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "ticket id is required to cancel".to_string(),
            ));
        }
        if runner_ids.is_empty() || runner_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ClientError::InvalidRequest(format!(
                "runner ids are required to cancel ticket {}",
                ticket_id
            )));
        }

        let url = self.endpoint(&["api", "pipeline", "queue", ticket_id])?;
        let response = self
            .authorize(self.client.delete(url))
            .query(&CancelQuery::new(runner_ids))
            .send()
            .await?;

        let ticket: QueueTicket = self.handle_response(response).await?;

        if ticket.status != TicketStatus::Canceled {
            return Err(ClientError::CancelRejected {
                status: ticket.status,
                message: ticket.error_message,
            });
        }

        info!("Ticket {} canceled", ticket_id);
        Ok(ticket)
    }

    /// Cancel using the runner ids recorded on the ticket
    pub async fn cancel_ticket(&self, ticket: &QueueTicket) -> Result<QueueTicket> {
        self.cancel(&ticket.ticket_id, &ticket.assigned_runner_ids())
            .await
    }
}
