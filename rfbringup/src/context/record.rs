//! Error records kept on the context.

use crate::errors::{BringupError, ErrorKind};
use serde::{Deserialize, Serialize};

/// The last error observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Taxonomy kind.
    pub kind: ErrorKind,
    /// Stage that raised it.
    pub stage: String,
    /// One-based stage position.
    pub ordinal: usize,
    /// Diagnostic message.
    pub message: String,
}

impl ErrorRecord {
    /// Records `error` raised by `stage`.
    #[must_use]
    pub fn new(stage: impl Into<String>, ordinal: usize, error: &BringupError) -> Self {
        Self {
            kind: error.kind(),
            stage: stage.into(),
            ordinal,
            message: error.to_string(),
        }
    }
}
