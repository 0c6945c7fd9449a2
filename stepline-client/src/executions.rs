//! Execution history endpoints

use stepline_core::domain::execution::ExecutionSummary;
use stepline_core::dto::execution::Page;

use crate::QueueClient;
use crate::error::Result;

impl QueueClient {
    // =============================================================================
    // Execution History
    // =============================================================================

    /// List workflow executions, optionally restricted to one pipeline
    pub async fn list_workflows(
        &self,
        pipeline_id: Option<&str>,
        page: Page,
    ) -> Result<Vec<ExecutionSummary>> {
        let url = match pipeline_id {
            Some(id) => self.endpoint(&["api", "pipeline", "list-workflows", id])?,
            None => self.endpoint(&["api", "pipeline", "list-workflows"])?,
        };
        let response = self
            .authorize(self.client.get(url))
            .query(&page)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List execution results across all pipelines
    pub async fn list_results(&self, page: Page) -> Result<Vec<ExecutionSummary>> {
        let url = self.endpoint(&["api", "pipeline", "list-results"])?;
        let response = self
            .authorize(self.client.get(url))
            .query(&page)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
