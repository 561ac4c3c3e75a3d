//! Diagnostic event sinks.
//!
//! Every stage transition, resource acquisition and release, and checkpoint
//! outcome of a run is reported to an [`EventSink`]. Payloads always carry
//! the run id and an RFC 3339 timestamp.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
