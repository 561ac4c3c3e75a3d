//! Shared state threaded through a bring-up run.
//!
//! A [`BringupContext`] owns everything one run touches: the explicit
//! configuration and the rates derived from it, the board's driver
//! collaborators, the firmware image, the teardown stack of live handles,
//! and the diagnostics gathered along the way. It is exclusively borrowed by
//! one stage at a time.

#[cfg(test)]
mod context_tests;
mod record;

pub use record::ErrorRecord;

use crate::checkpoint::Checkpoint;
use crate::config::{BringupConfig, Firmware, LinkRates};
use crate::core::{Advisory, BringupEvent, LaneInfo, LinkId, LinkReport};
use crate::drivers::{
    Board, DigitalLink, DmaChannel, FirmwareVersion, FrequencySynth, SerdesLaneGroup, Transceiver,
};
use crate::errors::{BringupError, ConfigError};
use crate::events::{EventSink, NoOpEventSink};
use crate::resources::{names, ResourceHandle, TeardownReport, TeardownStack};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Per-stage bookkeeping.
#[derive(Debug, Clone)]
struct ActiveStage {
    name: String,
    ordinal: usize,
    acquired: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct DerivedRates {
    rx: LinkRates,
    tx: LinkRates,
    obs_rx: LinkRates,
}

/// What survives a successful run.
pub(crate) struct ContextParts {
    pub run_id: Uuid,
    pub teardown: TeardownStack,
    pub advisories: Vec<Advisory>,
    pub link_reports: Vec<LinkReport>,
    pub firmware_version: Option<FirmwareVersion>,
    pub sink: Arc<dyn EventSink>,
}

/// Mutable state of one bring-up run.
pub struct BringupContext {
    run_id: Uuid,
    config: BringupConfig,
    rates: DerivedRates,
    board: Board,
    firmware: Firmware,
    teardown: TeardownStack,
    advisories: Vec<Advisory>,
    link_reports: Vec<LinkReport>,
    firmware_version: Option<FirmwareVersion>,
    last_error: Option<ErrorRecord>,
    stage: Option<ActiveStage>,
    sink: Arc<dyn EventSink>,
}

impl BringupContext {
    /// Creates the context of a new run.
    ///
    /// The configuration is validated and per-link rates are derived here,
    /// before any hardware is touched.
    pub fn new(config: BringupConfig, board: Board, firmware: Firmware) -> Result<Self, ConfigError> {
        config.validate()?;
        let rates = DerivedRates {
            rx: config.link_rates(LinkId::Rx)?,
            tx: config.link_rates(LinkId::Tx)?,
            obs_rx: config.link_rates(LinkId::ObsRx)?,
        };

        Ok(Self {
            run_id: Uuid::new_v4(),
            config,
            rates,
            board,
            firmware,
            teardown: TeardownStack::new(),
            advisories: Vec::new(),
            link_reports: Vec::new(),
            firmware_version: None,
            last_error: None,
            stage: None,
            sink: Arc::new(NoOpEventSink),
        })
    }

    /// Sets the diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the run id.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Run id.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &BringupConfig {
        &self.config
    }

    /// Derived rates of `link`.
    #[must_use]
    pub const fn link_rates(&self, link: LinkId) -> LinkRates {
        match link {
            LinkId::Rx => self.rates.rx,
            LinkId::Tx => self.rates.tx,
            LinkId::ObsRx => self.rates.obs_rx,
        }
    }

    /// Firmware image.
    #[must_use]
    pub const fn firmware(&self) -> &Firmware {
        &self.firmware
    }

    /// Driver collaborators.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The diagnostic sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Reports an event, stamped with the run id.
    pub fn emit(&self, event: BringupEvent) {
        let event_type = event.event_type.clone();
        let payload = event
            .add_data("run_id", serde_json::json!(self.run_id.to_string()))
            .into_payload();
        self.sink.try_emit(&event_type, Some(payload));
    }

    /// Pushes a freshly acquired handle onto the teardown stack.
    ///
    /// Stages call this immediately after acquisition, before any check
    /// that might fail, so the handle is released if the stage fails later.
    pub fn register(&mut self, handle: ResourceHandle) {
        let name = handle.name().to_string();
        let stage = self.stage.as_ref().map(|s| s.name.clone());
        self.emit(BringupEvent::resource_acquired(&name, handle.kind(), stage.as_deref()));
        if let Some(active) = self.stage.as_mut() {
            active.acquired.push(name);
        }
        self.teardown.push(handle);
    }

    /// Number of live handles.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.teardown.len()
    }

    /// Names of live handles in acquisition order.
    #[must_use]
    pub fn live_names(&self) -> Vec<String> {
        self.teardown.names()
    }

    /// A live handle by name.
    pub fn handle_mut(&mut self, name: &str) -> Result<&mut ResourceHandle, BringupError> {
        self.teardown
            .find_mut(name)
            .ok_or_else(|| BringupError::missing(name))
    }

    /// The transceiver device.
    pub fn transceiver(&mut self) -> Result<&mut dyn Transceiver, BringupError> {
        self.handle_mut(names::TRANSCEIVER)?
            .as_transceiver()
            .ok_or_else(|| BringupError::missing(names::TRANSCEIVER))
    }

    /// A synthesizer by name.
    pub fn synth(&mut self, name: &str) -> Result<&mut dyn FrequencySynth, BringupError> {
        self.handle_mut(name)?
            .as_synth()
            .ok_or_else(|| BringupError::missing(name))
    }

    /// A link core by name.
    pub fn link(&mut self, name: &str) -> Result<&mut dyn DigitalLink, BringupError> {
        self.handle_mut(name)?
            .as_link()
            .ok_or_else(|| BringupError::missing(name))
    }

    /// A SerDes lane group by name.
    pub fn serdes(&mut self, name: &str) -> Result<&mut dyn SerdesLaneGroup, BringupError> {
        self.handle_mut(name)?
            .as_serdes()
            .ok_or_else(|| BringupError::missing(name))
    }

    /// A DMA channel by name.
    pub fn dma(&mut self, name: &str) -> Result<&mut dyn DmaChannel, BringupError> {
        self.handle_mut(name)?
            .as_dma()
            .ok_or_else(|| BringupError::missing(name))
    }

    /// Runs a checkpoint against `observed`.
    ///
    /// A pass or an advisory mismatch returns `Ok`; the mismatch is recorded
    /// as an advisory. A fatal mismatch returns the error that halts the run.
    pub fn verify(&mut self, checkpoint: &Checkpoint, observed: u32) -> Result<(), BringupError> {
        self.verify_with_lanes(checkpoint, observed, Vec::new())
    }

    /// Runs a checkpoint and attaches per-lane detail to its snapshot.
    pub fn verify_with_lanes(
        &mut self,
        checkpoint: &Checkpoint,
        observed: u32,
        lanes: Vec<LaneInfo>,
    ) -> Result<(), BringupError> {
        let outcome = checkpoint.check(observed).with_lanes(lanes);
        let snapshot = serde_json::to_value(outcome.snapshot()).unwrap_or(serde_json::Value::Null);

        if outcome.is_pass() {
            info!(checkpoint = checkpoint.name(), observed, "Checkpoint passed");
            self.emit(BringupEvent::new("checkpoint.passed").add_data("snapshot", snapshot));
        } else {
            warn!(
                checkpoint = checkpoint.name(),
                observed,
                expected = checkpoint.expected(),
                severity = %checkpoint.severity(),
                "Checkpoint mismatch"
            );
            self.emit(
                BringupEvent::new("checkpoint.mismatch")
                    .add_data("snapshot", snapshot)
                    .add_data("severity", serde_json::json!(checkpoint.severity().to_string())),
            );
        }

        if let Some(advisory) = outcome.into_result()? {
            self.advisories.push(advisory);
        }
        Ok(())
    }

    /// Records an advisory that does not come from a checkpoint.
    pub fn advise(&mut self, advisory: Advisory) {
        warn!(kind = %advisory.kind(), "{}", advisory);
        self.advisories.push(advisory);
    }

    /// Advisories raised so far.
    #[must_use]
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Keeps a post-enable link status report.
    pub fn record_link_report(&mut self, report: LinkReport) {
        self.emit(
            BringupEvent::new("link.status")
                .add_data("report", serde_json::to_value(&report).unwrap_or(serde_json::Value::Null)),
        );
        self.link_reports.push(report);
    }

    /// Link status reports gathered so far.
    #[must_use]
    pub fn link_reports(&self) -> &[LinkReport] {
        &self.link_reports
    }

    /// Records the firmware version read back after load.
    pub fn set_firmware_version(&mut self, version: FirmwareVersion) {
        self.firmware_version = Some(version);
    }

    /// Firmware version, if it could be read back.
    #[must_use]
    pub const fn firmware_version(&self) -> Option<FirmwareVersion> {
        self.firmware_version
    }

    /// The last error observed.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    pub(crate) fn begin_stage(&mut self, name: &str, ordinal: usize) {
        self.stage = Some(ActiveStage {
            name: name.to_string(),
            ordinal,
            acquired: Vec::new(),
        });
    }

    /// Ends the current stage, returning the handles it registered.
    pub(crate) fn finish_stage(&mut self) -> Vec<String> {
        self.stage.take().map(|s| s.acquired).unwrap_or_default()
    }

    pub(crate) fn record_error(&mut self, error: &BringupError) {
        let (stage, ordinal) = self
            .stage
            .as_ref()
            .map_or_else(|| (String::new(), 0), |s| (s.name.clone(), s.ordinal));
        self.last_error = Some(ErrorRecord::new(stage, ordinal, error));
    }

    /// Releases every live handle, most recent first.
    ///
    /// Never fails; a second call finds an empty stack and does nothing.
    pub fn teardown(&mut self) -> TeardownReport {
        drain_with_events(&mut self.teardown, self.run_id, self.sink.as_ref())
    }

    pub(crate) fn into_parts(mut self) -> ContextParts {
        ContextParts {
            run_id: self.run_id,
            teardown: std::mem::take(&mut self.teardown),
            advisories: std::mem::take(&mut self.advisories),
            link_reports: std::mem::take(&mut self.link_reports),
            firmware_version: self.firmware_version,
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Handles still live when the context goes away, after a panicking stage
/// or an abandoned run, are released here.
impl Drop for BringupContext {
    fn drop(&mut self) {
        if !self.teardown.is_empty() {
            warn!(
                run_id = %self.run_id,
                live = self.teardown.len(),
                stage = self.stage.as_ref().map(|s| s.name.as_str()),
                "Bring-up context dropped with live handles"
            );
            let _ = self.teardown();
        }
    }
}

impl fmt::Debug for BringupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BringupContext")
            .field("run_id", &self.run_id)
            .field("backend", &self.config.backend)
            .field("live", &self.teardown.names())
            .field("advisories", &self.advisories.len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

/// Drains `stack` and reports every release to `sink`.
pub(crate) fn drain_with_events(
    stack: &mut TeardownStack,
    run_id: Uuid,
    sink: &dyn EventSink,
) -> TeardownReport {
    if stack.is_empty() {
        return TeardownReport::default();
    }

    info!(live = stack.len(), "Tearing down");
    let run_id = run_id.to_string();
    let emit = |event: BringupEvent| {
        let event_type = event.event_type.clone();
        let payload = event.add_data("run_id", serde_json::json!(run_id)).into_payload();
        sink.try_emit(&event_type, Some(payload));
    };

    let report = stack.drain_with(|name, failure| match failure {
        None => emit(BringupEvent::resource_released(name)),
        Some(failure) => emit(BringupEvent::resource_release_failed(
            name,
            failure.kind,
            &failure.message,
        )),
    });
    emit(
        BringupEvent::new("teardown.completed")
            .add_data("released", serde_json::json!(report.released))
            .add_data("failures", serde_json::json!(report.failures.len())),
    );

    report
}
