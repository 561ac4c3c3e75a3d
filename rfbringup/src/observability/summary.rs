//! Wide run-summary payloads.

use crate::core::StageStatus;
use serde::{Deserialize, Serialize};

/// What happened to one stage during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// One-based position in the pipeline.
    pub ordinal: usize,
    /// Final status.
    pub status: StageStatus,
    /// Wall time in milliseconds.
    pub duration_ms: f64,
    /// Handles registered by the stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acquired: Vec<String>,
}

/// Summary of a complete run, emitted once with the terminal pipeline
/// event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run id.
    pub run_id: String,
    /// Per-stage records, in execution order.
    pub stages: Vec<StageRecord>,
    /// Number of advisories raised.
    pub advisories: usize,
    /// Handles live at the end of the run.
    pub live_handles: usize,
    /// Total wall time in milliseconds.
    pub duration_ms: f64,
}

impl RunSummary {
    /// Creates an empty summary for `run_id`.
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// Appends a stage record.
    pub fn record(&mut self, record: StageRecord) {
        self.stages.push(record);
    }

    /// Name of the first failed stage, if any.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.status == StageStatus::Fail)
            .map(|s| s.name.as_str())
    }

    /// Builds the event payload.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(ref mut map) = payload {
            let statuses: Vec<_> = self
                .stages
                .iter()
                .map(|s| serde_json::json!({ "stage": s.name, "status": s.status.to_string() }))
                .collect();
            map.insert("stage_statuses".to_string(), serde_json::json!(statuses));
            if let Some(failed) = self.failed_stage() {
                map.insert("failed_stage".to_string(), serde_json::json!(failed));
            }
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, ordinal: usize, status: StageStatus) -> StageRecord {
        StageRecord {
            name: name.to_string(),
            ordinal,
            status,
            duration_ms: 1.0,
            acquired: Vec::new(),
        }
    }

    #[test]
    fn test_payload_names_failed_stage() {
        let mut summary = RunSummary::new("run-1");
        summary.record(record("platform", 1, StageStatus::Ok));
        summary.record(record("clock-source", 2, StageStatus::Ok));
        summary.record(record("clock-synthesizers", 3, StageStatus::Fail));

        let payload = summary.to_payload();
        assert_eq!(payload["run_id"], "run-1");
        assert_eq!(payload["failed_stage"], "clock-synthesizers");
        assert_eq!(payload["stage_statuses"][1]["status"], "ok");
        assert_eq!(payload["stages"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_payload_without_failure() {
        let mut summary = RunSummary::new("run-2");
        summary.record(record("platform", 1, StageStatus::Ok));
        let payload = summary.to_payload();
        assert!(payload.get("failed_stage").is_none());
    }
}
