//! Queue ticket domain types
//!
//! A ticket is the server-issued handle of a submitted pipeline. Every field
//! comes from a server response; the client never edits a ticket locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a ticket or of one of its runners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Queued,
    Starting,
    Running,
    Failed,
    Canceled,
    NotFound,
    /// Status reported by a newer server
    #[serde(other)]
    Unknown,
}

impl TicketStatus {
    /// Statuses that mean the submission was accepted
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            TicketStatus::Queued | TicketStatus::Starting | TicketStatus::Running
        )
    }

    /// Statuses after which the ticket will not change anymore
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TicketStatus::Failed | TicketStatus::Canceled | TicketStatus::NotFound
        )
    }

    /// `running` or any later stage
    pub fn is_running_or_later(self) -> bool {
        matches!(self, TicketStatus::Running) || self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Queued => "queued",
            TicketStatus::Starting => "starting",
            TicketStatus::Running => "running",
            TicketStatus::Failed => "failed",
            TicketStatus::Canceled => "canceled",
            TicketStatus::NotFound => "not_found",
            TicketStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one runner assigned to a ticket
///
/// Runners of the same ticket move through the lifecycle independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerStatus {
    pub runner_id: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub line_len: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RunnerStatus {
    /// One-based queue position shown to users
    pub fn display_position(&self) -> u32 {
        self.position + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTicket {
    pub ticket_id: String,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub runner_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_runner_id: Option<String>,
    #[serde(default)]
    pub required_runner_ids: Vec<String>,
    pub status: TicketStatus,
    /// Zero-based position in the queue
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub line_len: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub runners: Vec<RunnerStatus>,
}

impl QueueTicket {
    /// One-based queue position shown to users
    pub fn display_position(&self) -> u32 {
        self.position + 1
    }

    /// The engine accepted the run: a workflow and run id exist on a running-or-later ticket
    ///
    /// Whether the run succeeds is reported later by the workflow status API.
    pub fn execution_started(&self) -> bool {
        self.status.is_running_or_later() && self.workflow_id.is_some() && self.run_id.is_some()
    }

    /// Runner ids to release on cancellation
    ///
    /// Falls back to the per-runner entries when the top-level list is empty.
    pub fn assigned_runner_ids(&self) -> Vec<String> {
        if !self.runner_ids.is_empty() {
            return self.runner_ids.clone();
        }
        self.runners.iter().map(|r| r.runner_id.clone()).collect()
    }

    pub fn runner(&self, runner_id: &str) -> Option<&RunnerStatus> {
        self.runners.iter().find(|r| r.runner_id == runner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(value: serde_json::Value) -> QueueTicket {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_position_zero_displays_as_one() {
        let t = ticket(json!({
            "ticket_id": "t1",
            "enqueued_at": "2026-01-01T00:00:00Z",
            "status": "queued",
            "position": 0,
            "line_len": 3
        }));
        assert_eq!(t.display_position(), 1);
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let t = ticket(json!({
            "ticket_id": "t1",
            "enqueued_at": "2026-01-01T00:00:00Z",
            "status": "paused"
        }));
        assert_eq!(t.status, TicketStatus::Unknown);
        assert!(!t.status.is_accepted());
    }

    #[test]
    fn test_execution_started_needs_workflow_and_run() {
        let mut t = ticket(json!({
            "ticket_id": "t1",
            "enqueued_at": "2026-01-01T00:00:00Z",
            "status": "running",
            "workflow_id": "wf-1"
        }));
        assert!(!t.execution_started());
        t.run_id = Some("run-1".to_string());
        assert!(t.execution_started());
        t.status = TicketStatus::Starting;
        assert!(!t.execution_started());
    }

    #[test]
    fn test_runners_keep_independent_status() {
        let t = ticket(json!({
            "ticket_id": "t1",
            "enqueued_at": "2026-01-01T00:00:00Z",
            "status": "starting",
            "runner_ids": ["leader", "follower"],
            "leader_runner_id": "leader",
            "runners": [
                {"runner_id": "leader", "status": "starting"},
                {"runner_id": "follower", "status": "queued", "position": 2, "line_len": 4}
            ]
        }));
        assert_eq!(t.runner("leader").unwrap().status, TicketStatus::Starting);
        let follower = t.runner("follower").unwrap();
        assert_eq!(follower.status, TicketStatus::Queued);
        assert_eq!(follower.display_position(), 3);
    }

    #[test]
    fn test_assigned_runner_ids_falls_back_to_runner_entries() {
        let t = ticket(json!({
            "ticket_id": "t1",
            "enqueued_at": "2026-01-01T00:00:00Z",
            "status": "queued",
            "runners": [{"runner_id": "r1", "status": "queued"}]
        }));
        assert_eq!(t.assigned_runner_ids(), vec!["r1".to_string()]);
    }

    #[test]
    fn test_status_predicates() {
        assert!(TicketStatus::Starting.is_accepted());
        assert!(!TicketStatus::Failed.is_accepted());
        assert!(TicketStatus::NotFound.is_terminal());
        assert!(!TicketStatus::Running.is_terminal());
        assert!(TicketStatus::Canceled.is_running_or_later());
        assert!(!TicketStatus::Queued.is_running_or_later());
    }
}
