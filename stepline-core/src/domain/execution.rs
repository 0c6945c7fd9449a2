//! Execution history types
//!
//! Rows returned by the read-only execution listings. Only the fields this
//! workspace displays are typed; the rest is kept verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_keeps_unknown_fields() {
        let summary: ExecutionSummary = serde_json::from_value(json!({
            "workflow_id": "wf-1",
            "run_id": "run-1",
            "status": "Completed",
            "display_name": "Nightly"
        }))
        .unwrap();
        assert_eq!(summary.status, "Completed");
        assert_eq!(summary.start_time, None);
        assert_eq!(summary.extra["display_name"], "Nightly");
    }
}
