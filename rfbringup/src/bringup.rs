//! Top-level bring-up entry.
//!
//! [`bring_up`] validates its inputs, runs the standard pipeline over a
//! fresh [`BringupContext`], and on success hands every live handle to a
//! [`RadioSession`]. The session releases them, most recent first, on
//! [`RadioSession::shutdown`] or when dropped.

use crate::config::{BringupConfig, Firmware};
use crate::context::{drain_with_events, BringupContext};
use crate::core::{Advisory, LinkReport};
use crate::drivers::{Board, FirmwareVersion};
use crate::errors::BringupError;
use crate::events::EventSink;
use crate::observability::RunSummary;
use crate::pipeline::{BringupFailure, Pipeline};
use crate::resources::{TeardownReport, TeardownStack};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Brings the board up with the standard pipeline.
///
/// An empty firmware image or an invalid configuration is rejected before
/// any hardware is touched.
pub async fn bring_up(
    config: BringupConfig,
    board: Board,
    firmware: Firmware,
    sink: Arc<dyn EventSink>,
) -> Result<RadioSession, BringupFailure> {
    bring_up_with(&Pipeline::standard(), config, board, firmware, sink).await
}

/// Brings the board up with `pipeline`.
pub async fn bring_up_with(
    pipeline: &Pipeline,
    config: BringupConfig,
    board: Board,
    firmware: Firmware,
    sink: Arc<dyn EventSink>,
) -> Result<RadioSession, BringupFailure> {
    if firmware.is_empty() {
        return Err(BringupFailure::preflight(BringupError::FirmwareLoad {
            reason: format!("firmware image '{}' is empty", firmware.name()),
        }));
    }

    let mut ctx = BringupContext::new(config, board, firmware)
        .map_err(|e| BringupFailure::preflight(e.into()))?
        .with_sink(sink);

    let summary = pipeline.run(&mut ctx).await?;
    Ok(RadioSession::new(ctx, summary))
}

/// A board that completed bring-up.
///
/// Owns every handle acquired by the run.
pub struct RadioSession {
    run_id: Uuid,
    teardown: TeardownStack,
    advisories: Vec<Advisory>,
    link_reports: Vec<LinkReport>,
    firmware_version: Option<FirmwareVersion>,
    summary: RunSummary,
    sink: Arc<dyn EventSink>,
}

impl RadioSession {
    fn new(ctx: BringupContext, summary: RunSummary) -> Self {
        let parts = ctx.into_parts();
        Self {
            run_id: parts.run_id,
            teardown: parts.teardown,
            advisories: parts.advisories,
            link_reports: parts.link_reports,
            firmware_version: parts.firmware_version,
            summary,
            sink: parts.sink,
        }
    }

    /// Run id.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Advisories raised during bring-up.
    #[must_use]
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Link status reported after radio-on.
    #[must_use]
    pub fn link_reports(&self) -> &[LinkReport] {
        &self.link_reports
    }

    /// Firmware version, if it could be read back.
    #[must_use]
    pub const fn firmware_version(&self) -> Option<FirmwareVersion> {
        self.firmware_version
    }

    /// Per-stage record of the run.
    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Names of live handles in acquisition order.
    #[must_use]
    pub fn live_handles(&self) -> Vec<String> {
        self.teardown.names()
    }

    /// Releases every handle, most recent first.
    ///
    /// A second call finds nothing to release.
    pub fn shutdown(&mut self) -> TeardownReport {
        info!(run_id = %self.run_id, live = self.teardown.len(), "Shutting down radio");
        drain_with_events(&mut self.teardown, self.run_id, self.sink.as_ref())
    }
}

impl Drop for RadioSession {
    fn drop(&mut self) {
        if !self.teardown.is_empty() {
            warn!(
                run_id = %self.run_id,
                live = self.teardown.len(),
                "Radio session dropped without shutdown"
            );
            let _ = self.shutdown();
        }
    }
}

impl fmt::Debug for RadioSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadioSession")
            .field("run_id", &self.run_id)
            .field("live", &self.teardown.names())
            .field("advisories", &self.advisories.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::events::{CollectingEventSink, NoOpEventSink};
    use crate::pipeline::{PipelineBuilder, PREFLIGHT};
    use crate::testing::{
        assert_released_in_reverse, test_config, test_firmware, AcquiringStage, ReleaseLog,
        SimulatedBoard,
    };
    use pretty_assertions::assert_eq;

    fn noop() -> Arc<dyn EventSink> {
        Arc::new(NoOpEventSink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_owns_handles_until_shutdown() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut session = bring_up(test_config(), sim.board(), test_firmware(), sink.clone())
            .await
            .unwrap();

        let live = session.live_handles();
        assert_eq!(live.len(), 14);
        assert_eq!(session.link_reports().len(), 3);
        assert!(session.advisories().is_empty());
        assert_eq!(session.summary().stages.len(), 14);
        assert!(sim.releases().is_empty());

        let report = session.shutdown();
        assert!(report.is_clean());
        assert_released_in_reverse(&live, &sim.releases());
        assert!(session.live_handles().is_empty());
        assert_eq!(sink.count_of("resource.released"), 14);

        assert_eq!(session.shutdown().attempted(), 0);
        assert_eq!(sink.count_of("teardown.completed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_session_releases() {
        let sim = SimulatedBoard::new();
        let session = bring_up(test_config(), sim.board(), test_firmware(), noop())
            .await
            .unwrap();

        drop(session);
        assert_eq!(sim.releases().len(), 14);
        assert_eq!(sim.releases().last().map(String::as_str), Some("platform"));
    }

    #[test]
    fn test_empty_firmware_rejected_before_hardware() {
        let sim = SimulatedBoard::new();
        let firmware = Firmware::from_bytes("blank.bin", Vec::<u8>::new());

        let failure =
            tokio_test::block_on(bring_up(test_config(), sim.board(), firmware, noop())).unwrap_err();
        assert_eq!(failure.stage, PREFLIGHT);
        assert_eq!(failure.kind(), ErrorKind::FirmwareLoadError);
        assert!(sim.journal().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected_before_hardware() {
        let sim = SimulatedBoard::new();
        let mut config = test_config();
        config.calibration.poll_interval_ms = 0;

        let failure =
            tokio_test::block_on(bring_up(config, sim.board(), test_firmware(), noop())).unwrap_err();
        assert_eq!(failure.ordinal, 0);
        assert_eq!(failure.kind(), ErrorKind::ConfigError);
        assert!(sim.journal().is_empty());
    }

    #[tokio::test]
    async fn test_custom_pipeline() {
        let sim = SimulatedBoard::new();
        let log = ReleaseLog::default();
        let pipeline = PipelineBuilder::new("custom")
            .stage(Arc::new(AcquiringStage::new("acquire", &["a", "b"], &log)))
            .unwrap()
            .build()
            .unwrap();

        let mut session = bring_up_with(&pipeline, test_config(), sim.board(), test_firmware(), noop())
            .await
            .unwrap();
        assert_eq!(session.live_handles(), vec!["a", "b"]);

        session.shutdown();
        assert_eq!(*log.lock(), vec!["b", "a"]);
    }
}
