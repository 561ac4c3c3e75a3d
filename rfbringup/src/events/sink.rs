//! Diagnostic sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, warn, Level};

/// Receives stage, resource and checkpoint events.
///
/// Sinks are fire-and-forget collaborators: the orchestrator never inspects
/// what a sink does with an event and a sink must never fail the run.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "stage.started")
    /// * `data` - Optional event payload
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event without waiting. Must not panic or block.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// A sink that writes events to the tracing subscriber.
///
/// Events reporting a failure, mismatch or incomplete calibration are
/// raised to WARN regardless of the configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn is_problem(event_type: &str) -> bool {
        event_type.ends_with("failed")
            || event_type.ends_with(".mismatch")
            || event_type.ends_with(".incomplete")
    }

    fn log_event(&self, event_type: &str, data: Option<&serde_json::Value>) {
        if Self::is_problem(event_type) {
            warn!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        } else if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        } else {
            info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// A sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Collected event types, in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Payloads of events whose type starts with `type_prefix`.
    #[must_use]
    pub fn payloads_of(&self, type_prefix: &str) -> Vec<serde_json::Value> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .map(|(_, data)| data.clone().unwrap_or(serde_json::Value::Null))
            .collect()
    }

    /// Number of events whose type starts with `type_prefix`.
    #[must_use]
    pub fn count_of(&self, type_prefix: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .count()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.try_emit(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit("stage.started", None).await;
        sink.try_emit("stage.completed", Some(json!({"stage": "platform"})));
    }

    #[tokio::test]
    async fn test_logging_sink_accepts_all_events() {
        let sink = LoggingEventSink::debug();
        sink.emit("checkpoint.passed", Some(json!({"observed": 1}))).await;
        sink.try_emit("checkpoint.mismatch", None);
        sink.try_emit("resource.release_failed", None);
    }

    #[test]
    fn test_problem_events() {
        assert!(LoggingEventSink::is_problem("stage.failed"));
        assert!(LoggingEventSink::is_problem("resource.release_failed"));
        assert!(LoggingEventSink::is_problem("clock.program_failed"));
        assert!(LoggingEventSink::is_problem("calibration.incomplete"));
        assert!(!LoggingEventSink::is_problem("checkpoint.passed"));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("stage.started", Some(json!({"stage": "platform"}))).await;
        sink.try_emit("resource.acquired", Some(json!({"resource": "platform"})));
        sink.try_emit("stage.completed", None);

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.event_types(),
            vec!["stage.started", "resource.acquired", "stage.completed"]
        );
        assert_eq!(sink.count_of("stage."), 2);
        assert_eq!(sink.payloads_of("resource.")[0]["resource"], "platform");
        assert_eq!(sink.payloads_of("stage.completed")[0], serde_json::Value::Null);

        sink.clear();
        assert!(sink.is_empty());
    }
}
