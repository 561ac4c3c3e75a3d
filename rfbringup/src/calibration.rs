//! Calibration waiter.
//!
//! Initialization calibrations run on the transceiver's embedded processor.
//! The waiter polls the engine at a fixed cadence until the requested mask
//! completes, an error is flagged, or the time budget runs out. Any result
//! that is not clean is followed by exactly one abort, which returns the
//! engine to an idle state.

use crate::config::CalibrationConfig;
use crate::core::{Advisory, CalibrationMask};
use crate::drivers::{CalibrationStatus, Transceiver};
use crate::errors::{BringupError, DriverError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Calibrations to run and their time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationRequest {
    /// Calibrations to run.
    pub mask: CalibrationMask,
    /// Time budget.
    pub timeout: Duration,
}

impl CalibrationRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(mask: CalibrationMask, timeout: Duration) -> Self {
        Self { mask, timeout }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationOutcome {
    /// Every requested calibration completed without error.
    Completed,
    /// The engine stopped with an error or with calibrations missing.
    Partial,
    /// The time budget ran out.
    TimedOut,
}

/// Engine state at the end of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Calibrations completed.
    pub completed: CalibrationMask,
    /// Outstanding error flag.
    pub error_flag: u8,
    /// Outstanding error code.
    pub error_code: u8,
    /// True if the wait ran out of time.
    pub timed_out: bool,
}

impl CalibrationResult {
    fn from_status(status: CalibrationStatus, timed_out: bool) -> Self {
        Self {
            completed: status.completed,
            error_flag: status.error_flag,
            error_code: status.error_code,
            timed_out,
        }
    }

    /// Classifies the result against the requested mask.
    #[must_use]
    pub const fn outcome(&self, requested: CalibrationMask) -> CalibrationOutcome {
        if self.timed_out {
            CalibrationOutcome::TimedOut
        } else if self.error_flag != 0 || self.error_code != 0 || !self.completed.contains(requested) {
            CalibrationOutcome::Partial
        } else {
            CalibrationOutcome::Completed
        }
    }
}

/// Everything one calibration pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationPass {
    /// The request that was run.
    pub request: CalibrationRequest,
    /// Engine state when the wait ended.
    pub result: CalibrationResult,
    /// Calibrations the abort reported complete, if an abort was needed.
    pub aborted_with: Option<CalibrationMask>,
}

impl CalibrationPass {
    /// Returns true if the pass completed cleanly.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.aborted_with.is_none()
    }

    /// The advisory to surface for a pass that was aborted.
    #[must_use]
    pub fn advisory(&self) -> Option<Advisory> {
        self.aborted_with.map(|completed| Advisory::CalibrationIncomplete {
            requested: self.request.mask,
            completed,
            error_flag: self.result.error_flag,
            error_code: self.result.error_code,
            timed_out: self.result.timed_out,
        })
    }
}

/// Bounded polling loop over the calibration engine.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationWaiter {
    poll_interval: Duration,
}

impl CalibrationWaiter {
    /// Creates a waiter polling every `poll_interval`.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Creates a waiter from the calibration settings.
    #[must_use]
    pub const fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(config.poll_interval())
    }

    /// Polls until the request completes, an error is flagged, or the
    /// timeout elapses.
    ///
    /// The engine is read at least once, even with a zero timeout.
    pub async fn wait(
        &self,
        device: &mut dyn Transceiver,
        request: &CalibrationRequest,
    ) -> Result<CalibrationResult, DriverError> {
        let deadline = Instant::now() + request.timeout;
        let mut polls = 0u32;

        loop {
            let status = device.poll_calibrations()?;
            polls += 1;

            if status.has_error() || !status.in_progress {
                debug!(polls, completed = %status.completed, "Calibration engine idle");
                return Ok(CalibrationResult::from_status(status, false));
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(polls, timeout_ms = request.timeout.as_millis(), "Calibration wait timed out");
                return Ok(CalibrationResult::from_status(status, true));
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Runs one calibration pass: start, wait, and abort unless the result
    /// is clean.
    ///
    /// A failed abort is fatal. A successful abort turns the incomplete
    /// calibration into an advisory carried by the returned pass.
    pub async fn run_pass(
        &self,
        device: &mut dyn Transceiver,
        request: CalibrationRequest,
    ) -> Result<CalibrationPass, BringupError> {
        info!(mask = %request.mask, "Running calibrations");
        device
            .run_calibrations(request.mask)
            .map_err(|e| BringupError::device("run calibrations", e))?;

        let result = self
            .wait(device, &request)
            .await
            .map_err(|e| BringupError::device("wait for calibrations", e))?;

        let aborted_with = match result.outcome(request.mask) {
            CalibrationOutcome::Completed => {
                info!(mask = %request.mask, "Calibrations completed");
                None
            }
            outcome => {
                warn!(
                    ?outcome,
                    error_flag = result.error_flag,
                    error_code = result.error_code,
                    "Calibrations incomplete, aborting"
                );
                let completed = device
                    .abort_calibrations()
                    .map_err(|source| BringupError::CalibrationAbort { source })?;
                info!(completed = %completed, "Calibrations aborted");
                Some(completed)
            }
        };

        Ok(CalibrationPass {
            request,
            result,
            aborted_with,
        })
    }
}
