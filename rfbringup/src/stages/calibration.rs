//! Initialization calibrations.

use super::Stage;
use crate::calibration::{CalibrationPass, CalibrationRequest, CalibrationWaiter};
use crate::context::BringupContext;
use crate::core::{BringupEvent, CalibrationMask};
use crate::errors::BringupError;
use async_trait::async_trait;
use tracing::info;

/// Runs the initialization calibrations.
///
/// Calibrations needing external analog conditions are split out: the rest
/// of the mask runs first, then the external LO-leakage calibration runs on
/// its own if it was requested. Each pass that does not finish cleanly is
/// aborted exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitCalibrationStage;

impl InitCalibrationStage {
    /// Stage name.
    pub const NAME: &'static str = "init-calibrations";
    const EXTERNAL: CalibrationMask = CalibrationMask::TX_LO_LEAKAGE_EXTERNAL;

    async fn run(
        ctx: &mut BringupContext,
        waiter: CalibrationWaiter,
        request: CalibrationRequest,
    ) -> Result<(), BringupError> {
        let pass = waiter.run_pass(ctx.transceiver()?, request).await?;
        Self::report(ctx, &pass);
        Ok(())
    }

    fn report(ctx: &mut BringupContext, pass: &CalibrationPass) {
        let payload = serde_json::json!({
            "requested": pass.request.mask.bits(),
            "completed": pass.result.completed.bits(),
            "error_flag": pass.result.error_flag,
            "error_code": pass.result.error_code,
            "timed_out": pass.result.timed_out,
        });

        match pass.advisory() {
            None => ctx.emit(BringupEvent::new("calibration.completed").add_data("result", payload)),
            Some(advisory) => {
                let aborted = pass.aborted_with.map_or(0, CalibrationMask::bits);
                ctx.emit(
                    BringupEvent::new("calibration.incomplete")
                        .add_data("result", payload)
                        .add_data("aborted_with", serde_json::json!(aborted)),
                );
                ctx.advise(advisory);
            }
        }
    }
}

#[async_trait]
impl Stage for InitCalibrationStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let config = ctx.config().calibration.clone();
        let waiter = CalibrationWaiter::from_config(&config);
        let internal = config.init_mask.without(Self::EXTERNAL);

        if !internal.is_empty() {
            Self::run(ctx, waiter, CalibrationRequest::new(internal, config.timeout())).await?;
        }

        if config.init_mask.contains(Self::EXTERNAL) {
            info!("Running external LO leakage calibration");
            Self::run(ctx, waiter, CalibrationRequest::new(Self::EXTERNAL, config.timeout())).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalibrationConfig;
    use crate::core::Advisory;
    use crate::drivers::CalibrationStatus;
    use crate::errors::{DriverError, ErrorKind};
    use crate::events::CollectingEventSink;
    use crate::testing::{run_until, test_context_with, test_context_with_sink, test_config, SimulatedBoard};
    use std::sync::Arc;

    fn with_mask(mask: CalibrationMask) -> crate::config::BringupConfig {
        test_config().with_calibration(CalibrationConfig {
            init_mask: mask,
            ..CalibrationConfig::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_run_never_aborts() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        run_until(&mut ctx, InitCalibrationStage::NAME).await.unwrap();

        InitCalibrationStage.execute(&mut ctx).await.unwrap();
        assert_eq!(sim.abort_count(), 0);
        assert_eq!(sink.count_of("calibration.completed"), 1);
        assert!(ctx.advisories().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_flag_aborts_once_and_continues() {
        let sim = SimulatedBoard::new();
        sim.script_calibrations([CalibrationStatus {
            in_progress: false,
            completed: CalibrationMask::NONE,
            error_flag: 1,
            error_code: 5,
        }]);
        let mut ctx = test_context_with(&sim, with_mask(CalibrationMask::default_init())).unwrap();
        run_until(&mut ctx, InitCalibrationStage::NAME).await.unwrap();

        InitCalibrationStage.execute(&mut ctx).await.unwrap();
        assert_eq!(sim.abort_count(), 1);
        assert!(matches!(
            ctx.advisories(),
            [Advisory::CalibrationIncomplete {
                error_flag: 1,
                error_code: 5,
                ..
            }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_pass_runs_in_isolation() {
        let sim = SimulatedBoard::new();
        let mask = CalibrationMask::DC_OFFSET | CalibrationMask::TX_LO_LEAKAGE_EXTERNAL;
        let mut ctx = test_context_with(&sim, with_mask(mask)).unwrap();
        run_until(&mut ctx, InitCalibrationStage::NAME).await.unwrap();

        InitCalibrationStage.execute(&mut ctx).await.unwrap();
        assert_eq!(
            sim.journal_matching("xcvr.run_cals"),
            vec![
                format!("xcvr.run_cals {:#x}", CalibrationMask::DC_OFFSET.bits()),
                format!("xcvr.run_cals {:#x}", CalibrationMask::TX_LO_LEAKAGE_EXTERNAL.bits()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_pass_skipped_when_not_requested() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context_with(&sim, with_mask(CalibrationMask::DC_OFFSET)).unwrap();
        run_until(&mut ctx, InitCalibrationStage::NAME).await.unwrap();

        InitCalibrationStage.execute(&mut ctx).await.unwrap();
        assert_eq!(sim.journal_matching("xcvr.run_cals").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_aborts() {
        let sim = SimulatedBoard::new();
        sim.script_calibrations([CalibrationStatus {
            in_progress: true,
            ..CalibrationStatus::default()
        }]);
        let mut ctx = test_context_with(&sim, with_mask(CalibrationMask::DC_OFFSET)).unwrap();
        run_until(&mut ctx, InitCalibrationStage::NAME).await.unwrap();

        InitCalibrationStage.execute(&mut ctx).await.unwrap();
        assert_eq!(sim.abort_count(), 1);
        assert!(matches!(
            ctx.advisories(),
            [Advisory::CalibrationIncomplete { timed_out: true, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_abort_is_fatal() {
        let sim = SimulatedBoard::new();
        sim.script_calibrations([CalibrationStatus {
            in_progress: false,
            completed: CalibrationMask::NONE,
            error_flag: 1,
            error_code: 0,
        }]);
        sim.fail_abort(DriverError::hardware(-9, "engine hung"));
        let mut ctx = test_context_with(&sim, with_mask(CalibrationMask::DC_OFFSET)).unwrap();
        run_until(&mut ctx, InitCalibrationStage::NAME).await.unwrap();

        let err = InitCalibrationStage.execute(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CalibrationIncomplete);
        assert_eq!(sim.abort_count(), 1);
    }
}
