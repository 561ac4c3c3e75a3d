//! Bring-up event type for stage transitions and checkpoint outcomes.

use super::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event reported to the diagnostic sink during a run.
///
/// Events are fire-and-forget: the orchestrator never depends on whether a
/// sink records them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BringupEvent {
    /// The event type (e.g., "stage.started", "checkpoint.mismatch").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (RFC 3339).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl BringupEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Converts the event into the payload handed to a sink.
    #[must_use]
    pub fn into_payload(self) -> serde_json::Value {
        let mut map: serde_json::Map<String, serde_json::Value> = self.data.into_iter().collect();
        map.insert("timestamp".to_string(), serde_json::json!(self.timestamp));
        serde_json::Value::Object(map)
    }

    /// Creates a "stage.started" event.
    #[must_use]
    pub fn stage_started(stage_name: &str, ordinal: usize) -> Self {
        Self::new("stage.started")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("ordinal", serde_json::json!(ordinal))
    }

    /// Creates a "stage.completed" event.
    #[must_use]
    pub fn stage_completed(stage_name: &str, duration_ms: f64, acquired: &[String]) -> Self {
        Self::new("stage.completed")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("duration_ms", serde_json::json!(duration_ms))
            .add_data("acquired", serde_json::json!(acquired))
    }

    /// Creates a "stage.failed" event.
    #[must_use]
    pub fn stage_failed(stage_name: &str, kind: &str, error: &str) -> Self {
        Self::new("stage.failed")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("kind", serde_json::json!(kind))
            .add_data("error", serde_json::json!(error))
    }

    /// Creates a "resource.acquired" event.
    #[must_use]
    pub fn resource_acquired(resource: &str, kind: ResourceKind, stage: Option<&str>) -> Self {
        Self::new("resource.acquired")
            .add_data("resource", serde_json::json!(resource))
            .add_data("kind", serde_json::json!(kind.to_string()))
            .add_data("stage", serde_json::json!(stage))
    }

    /// Creates a "resource.released" event.
    #[must_use]
    pub fn resource_released(resource: &str) -> Self {
        Self::new("resource.released").add_data("resource", serde_json::json!(resource))
    }

    /// Creates a "resource.release_failed" event.
    #[must_use]
    pub fn resource_release_failed(resource: &str, kind: ResourceKind, error: &str) -> Self {
        Self::new("resource.release_failed")
            .add_data("resource", serde_json::json!(resource))
            .add_data("kind", serde_json::json!(kind.to_string()))
            .add_data("error", serde_json::json!(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = BringupEvent::new("test.event");
        assert_eq!(event.event_type, "test.event");
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_event_stage_started() {
        let event = BringupEvent::stage_started("clock-source", 2);
        assert_eq!(event.event_type, "stage.started");
        assert_eq!(event.data.get("stage"), Some(&serde_json::json!("clock-source")));
        assert_eq!(event.data.get("ordinal"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_event_payload_carries_timestamp() {
        let event = BringupEvent::stage_completed("platform", 1.5, &["platform".to_string()]);
        let payload = event.into_payload();

        assert!(payload["timestamp"].is_string());
        assert_eq!(payload["acquired"][0], "platform");
    }

    #[test]
    fn test_resource_events() {
        let event = BringupEvent::resource_acquired("rx_jesd", ResourceKind::LinkRx, Some("link-layer"));
        assert_eq!(event.data.get("kind"), Some(&serde_json::json!("link_rx")));

        let event = BringupEvent::resource_release_failed("tx_xcvr", ResourceKind::SerdesLaneGroup, "bus closed");
        assert_eq!(event.event_type, "resource.release_failed");
        assert_eq!(event.data.get("error"), Some(&serde_json::json!("bus closed")));
    }
}
