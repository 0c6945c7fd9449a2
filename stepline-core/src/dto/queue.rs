//! Queue DTOs

use serde::{Deserialize, Serialize};

/// Body of `POST /api/pipeline/queue`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub pipeline_identifier: String,
    /// Compiled definition text
    pub yaml: String,
}

/// Query of `DELETE /api/pipeline/queue/{ticket_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelQuery {
    /// Comma-joined runner ids
    pub runner_ids: String,
}

impl CancelQuery {
    pub fn new(runner_ids: &[String]) -> Self {
        Self {
            runner_ids: runner_ids.join(","),
        }
    }
}
