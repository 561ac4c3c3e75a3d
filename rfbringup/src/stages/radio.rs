//! Tracking calibrations, radio-on and the link status report.

use super::sysref::read_lanes;
use super::Stage;
use crate::context::BringupContext;
use crate::core::{Advisory, LinkId, LinkReport, ObsRxSource};
use crate::errors::BringupError;
use crate::resources::names;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// Enables tracking calibrations, turns the radio on and hands the
/// observation path to the firmware.
///
/// The observation source always passes through `Off` before
/// `InternalCals`. The receive-link watchdogs are then armed, and after a
/// settle delay every FPGA link reports its status.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadioOnStage;

impl RadioOnStage {
    /// Stage name.
    pub const NAME: &'static str = "radio-on";
}

#[async_trait]
impl Stage for RadioOnStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let tracking = ctx.config().radio.tracking_mask;
        let settle = Duration::from_millis(ctx.config().radio.link_settle_ms);

        let device = ctx.transceiver()?;
        device
            .enable_tracking_calibrations(tracking)
            .map_err(|e| BringupError::device("enable tracking calibrations", e))?;
        device
            .radio_on()
            .map_err(|e| BringupError::device("radio on", e))?;
        for source in [ObsRxSource::Off, ObsRxSource::InternalCals] {
            device
                .set_obs_rx_source(source)
                .map_err(|e| BringupError::device(format!("select observation source {source}"), e))?;
        }
        info!(tracking = %tracking, "Radio on");

        for link in [LinkId::Rx, LinkId::ObsRx] {
            let name = names::link_core(link);
            if let Err(err) = ctx.link(&name)?.start_watchdog() {
                ctx.advise(Advisory::WatchdogUnavailable {
                    link,
                    message: err.to_string(),
                });
            }
        }

        tokio::time::sleep(settle).await;

        for link in LinkId::ALL {
            let name = names::link_core(link);
            let status = match ctx.link(&name)?.read_status() {
                Ok(status) => status,
                Err(err) => {
                    warn!(core = %name, error = %err, "Link status unavailable");
                    continue;
                }
            };
            let lanes = if link.is_receive() {
                read_lanes(ctx, link)
            } else {
                Vec::new()
            };
            info!(core = %name, status, lanes = lanes.len(), "Link status");
            ctx.record_link_report(LinkReport { link, status, lanes });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DriverError;
    use crate::events::CollectingEventSink;
    use crate::testing::{
        assert_in_order, run_until, test_context, test_context_with_sink, SimulatedBoard,
    };
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_observation_source_passes_through_off() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, RadioOnStage::NAME).await.unwrap();

        RadioOnStage.execute(&mut ctx).await.unwrap();
        assert_eq!(
            sim.obs_rx_sources(),
            vec![ObsRxSource::Off, ObsRxSource::InternalCals]
        );
        let radio_on = sim.position("xcvr.radio_on").unwrap();
        let tracking = sim.position("xcvr.tracking 0xcf").unwrap();
        assert!(tracking < radio_on);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_reports_after_settle() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        run_until(&mut ctx, RadioOnStage::NAME).await.unwrap();

        let start = tokio::time::Instant::now();
        RadioOnStage.execute(&mut ctx).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1000));

        assert_in_order(
            &sim.journal(),
            &[
                "xcvr.obs_rx internal_cals",
                "link.watchdog rx_jesd",
                "link.watchdog rx_os_jesd",
                "link.status rx_jesd",
            ],
        );
        assert_eq!(sim.journal_matching("link.watchdog").len(), 2);

        let reports = ctx.link_reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].lanes.len(), 2);
        assert!(reports[1].lanes.is_empty());
        assert_eq!(reports[2].lanes.len(), 2);
        assert_eq!(sink.count_of("link.status"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_link_status_is_skipped() {
        let sim = SimulatedBoard::new();
        sim.fail_on("link.status tx_jesd", DriverError::transport("axi timeout"));
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, RadioOnStage::NAME).await.unwrap();

        RadioOnStage.execute(&mut ctx).await.unwrap();
        let links: Vec<_> = ctx.link_reports().iter().map(|r| r.link).collect();
        assert_eq!(links, vec![LinkId::Rx, LinkId::ObsRx]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_failure_is_advisory() {
        let sim = SimulatedBoard::new();
        sim.fail_on("link.watchdog rx_os_jesd", DriverError::hardware(-1, "irq unavailable"));
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, RadioOnStage::NAME).await.unwrap();

        RadioOnStage.execute(&mut ctx).await.unwrap();
        assert!(matches!(
            ctx.advisories(),
            [Advisory::WatchdogUnavailable { link: LinkId::ObsRx, .. }]
        ));
        assert_eq!(ctx.link_reports().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_radio_on_failure_is_fatal() {
        let sim = SimulatedBoard::new();
        sim.fail_on("xcvr.radio_on", DriverError::hardware(-1, "arm busy"));
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, RadioOnStage::NAME).await.unwrap();

        assert!(RadioOnStage.execute(&mut ctx).await.is_err());
        assert!(sim.obs_rx_sources().is_empty());
    }
}
