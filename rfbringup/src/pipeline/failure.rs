//! The outcome of a failed run.

use crate::core::Advisory;
use crate::errors::{BringupError, ErrorKind};
use crate::resources::TeardownReport;
use thiserror::Error;

/// Name reported when a run is rejected before any stage starts.
pub const PREFLIGHT: &str = "preflight";

/// A run that halted.
///
/// Carries the primary error and the stage that raised it. Advisories
/// accumulated before the failure and the teardown report are secondary
/// diagnostics and never replace the primary cause.
#[derive(Debug, Error)]
#[error("stage '{stage}' (#{ordinal}) failed: {error}")]
pub struct BringupFailure {
    /// Name of the failing stage.
    pub stage: String,
    /// One-based position of the failing stage; zero for preflight.
    pub ordinal: usize,
    /// The primary error.
    #[source]
    pub error: BringupError,
    /// Advisories raised before the failure.
    pub advisories: Vec<Advisory>,
    /// What teardown released.
    pub teardown: TeardownReport,
}

impl BringupFailure {
    /// A failure raised before any hardware was touched.
    #[must_use]
    pub fn preflight(error: BringupError) -> Self {
        Self {
            stage: PREFLIGHT.to_string(),
            ordinal: 0,
            error,
            advisories: Vec::new(),
            teardown: TeardownReport::default(),
        }
    }

    /// Taxonomy kind of the primary error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DriverError;

    #[test]
    fn test_display_names_stage() {
        let failure = BringupFailure {
            stage: "link-layer".to_string(),
            ordinal: 4,
            error: BringupError::resource_init("rx_jesd", DriverError::hardware(-1, "no core")),
            advisories: Vec::new(),
            teardown: TeardownReport::default(),
        };

        let message = failure.to_string();
        assert!(message.contains("link-layer"));
        assert!(message.contains("#4"));
        assert!(message.contains("rx_jesd"));
        assert_eq!(failure.kind(), ErrorKind::ResourceInitError);
    }

    #[test]
    fn test_preflight_has_nothing_to_tear_down() {
        let failure = BringupFailure::preflight(BringupError::FirmwareLoad {
            reason: "image is empty".into(),
        });

        assert_eq!(failure.stage, PREFLIGHT);
        assert_eq!(failure.ordinal, 0);
        assert_eq!(failure.teardown.attempted(), 0);
    }
}
