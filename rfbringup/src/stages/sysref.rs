//! SYSREF gating and post-enable framer/deframer checks.

use super::Stage;
use crate::checkpoint::Checkpoint;
use crate::context::BringupContext;
use crate::core::{Framer, LaneInfo, LinkId};
use crate::errors::BringupError;
use crate::resources::names;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Gates SYSREF into the framers and deframer and starts the lane clocks.
///
/// The deframer must not see lane clock edges before its reset, and the
/// framers are gated before the device starts sending control characters.
/// Sequence:
///
/// 1. SYSREF into both receive framers
/// 2. SYSREF into the deframer off, deframer reset
/// 3. Transmit SerDes clock (backend permitting) and lane clock
/// 4. SYSREF into the deframer on, one pulse
/// 5. Receive and observation SerDes and lane clocks
/// 6. One more pulse per configured receive delay
#[derive(Debug, Clone, Copy, Default)]
pub struct SysrefEnableStage;

impl SysrefEnableStage {
    /// Stage name.
    pub const NAME: &'static str = "sysref-enable";
}

fn enable_link_clocks(ctx: &mut BringupContext, link: LinkId) -> Result<(), BringupError> {
    if ctx.config().backend.requires_serdes_clock_enable() {
        let lanes = names::serdes(link);
        ctx.serdes(&lanes)?
            .enable_clock()
            .map_err(|e| BringupError::device(format!("enable {lanes} clock"), e))?;
    }

    let core = names::link_core(link);
    ctx.link(&core)?
        .enable_lane_clock()
        .map_err(|e| BringupError::device(format!("enable {core} lane clock"), e))?;
    debug!(%link, "Lane clocks running");
    Ok(())
}

async fn pulse(ctx: &mut BringupContext, delay: Duration) -> Result<(), BringupError> {
    ctx.board_mut()
        .clock
        .request_sysref()
        .map_err(|e| BringupError::device("request sysref", e))?;
    tokio::time::sleep(delay).await;
    Ok(())
}

#[async_trait]
impl Stage for SysrefEnableStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let sysref = ctx.config().sysref.clone();

        let device = ctx.transceiver()?;
        for framer in [Framer::Rx, Framer::ObsRx] {
            device
                .enable_sysref_to_framer(framer, true)
                .map_err(|e| BringupError::device(format!("enable sysref to {framer}"), e))?;
        }
        device
            .enable_sysref_to_deframer(false)
            .map_err(|e| BringupError::device("disable sysref to deframer", e))?;
        device
            .reset_deframer()
            .map_err(|e| BringupError::device("reset deframer", e))?;

        enable_link_clocks(ctx, LinkId::Tx)?;

        ctx.transceiver()?
            .enable_sysref_to_deframer(true)
            .map_err(|e| BringupError::device("enable sysref to deframer", e))?;
        pulse(ctx, Duration::from_millis(sysref.tx_pulse_delay_ms)).await?;

        enable_link_clocks(ctx, LinkId::Rx)?;
        enable_link_clocks(ctx, LinkId::ObsRx)?;

        for delay_ms in sysref.rx_pulse_delays_ms {
            pulse(ctx, Duration::from_millis(delay_ms)).await?;
        }

        info!("SYSREF gated, lane clocks running");
        Ok(())
    }
}

/// Compares framer and deframer status with their steady-state values.
///
/// Mismatches are advisory; the links may still converge. The snapshot of a
/// mismatch carries the per-lane detail of the matching FPGA core.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramerStatusStage;

impl FramerStatusStage {
    /// Stage name.
    pub const NAME: &'static str = "framer-status";
}

/// Best-effort per-lane detail of an FPGA link core.
pub(crate) fn read_lanes(ctx: &mut BringupContext, link: LinkId) -> Vec<LaneInfo> {
    let name = names::link_core(link);
    let Ok(core) = ctx.link(&name) else {
        return Vec::new();
    };

    (0..core.lane_count())
        .filter_map(|lane| match core.read_lane_info(lane) {
            Ok(info) => Some(info),
            Err(err) => {
                debug!(core = %name, lane, error = %err, "Lane detail unavailable");
                None
            }
        })
        .collect()
}

fn verify_link(
    ctx: &mut BringupContext,
    checkpoint: &Checkpoint,
    link: LinkId,
    observed: u32,
) -> Result<(), BringupError> {
    let lanes = if checkpoint.matches(observed) {
        Vec::new()
    } else {
        read_lanes(ctx, link)
    };
    ctx.verify_with_lanes(checkpoint, observed, lanes)
}

#[async_trait]
impl Stage for FramerStatusStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let expected = ctx.config().expected.clone();

        for (framer, checkpoint) in [
            (Framer::Rx, Checkpoint::rx_framer(&expected)),
            (Framer::ObsRx, Checkpoint::orx_framer(&expected)),
        ] {
            let status = ctx
                .transceiver()?
                .read_framer_status(framer)
                .map_err(|e| BringupError::device(format!("read {framer} status"), e))?;
            verify_link(ctx, &checkpoint, framer.link(), status)?;
        }

        let status = ctx
            .transceiver()?
            .read_deframer_status()
            .map_err(|e| BringupError::device("read deframer status", e))?;
        verify_link(ctx, &Checkpoint::deframer(&expected), LinkId::Tx, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FpgaBackend;
    use crate::core::{Advisory, CheckKind};
    use crate::testing::{run_until, test_config, test_context, test_context_with, SimulatedBoard};
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_sysref_sequence() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, SysrefEnableStage::NAME).await.unwrap();
        let before = sim.journal().len();

        SysrefEnableStage.execute(&mut ctx).await.unwrap();
        assert_eq!(
            sim.journal()[before..].to_vec(),
            vec![
                "xcvr.framer_sysref rx_framer true",
                "xcvr.framer_sysref orx_framer true",
                "xcvr.deframer_sysref false",
                "xcvr.reset_deframer",
                "serdes.clock tx_xcvr",
                "link.lane_clock tx_jesd",
                "xcvr.deframer_sysref true",
                "clock.sysref",
                "serdes.clock rx_xcvr",
                "link.lane_clock rx_jesd",
                "serdes.clock rx_os_xcvr",
                "link.lane_clock rx_os_jesd",
                "clock.sysref",
                "clock.sysref",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fpll_backend_skips_serdes_clock_enable() {
        let sim = SimulatedBoard::new();
        let config = test_config().with_backend(FpgaBackend::A10Fpll);
        let mut ctx = test_context_with(&sim, config).unwrap();
        run_until(&mut ctx, SysrefEnableStage::NAME).await.unwrap();

        SysrefEnableStage.execute(&mut ctx).await.unwrap();
        assert!(sim.journal_matching("serdes.clock").is_empty());
        assert_eq!(sim.journal_matching("link.lane_clock").len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_delays() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, SysrefEnableStage::NAME).await.unwrap();

        let start = tokio::time::Instant::now();
        SysrefEnableStage.execute(&mut ctx).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1 + 1 + 5));
        assert!(elapsed < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_mismatch_is_advisory_with_lanes() {
        let sim = SimulatedBoard::new();
        sim.set_deframer_status(0x20);
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, FramerStatusStage::NAME).await.unwrap();

        FramerStatusStage.execute(&mut ctx).await.unwrap();
        match ctx.advisories() {
            [Advisory::CheckpointMismatch { snapshot }] => {
                assert_eq!(snapshot.kind, CheckKind::DeframerStatus);
                assert_eq!(snapshot.observed, 0x20);
                assert_eq!(snapshot.lanes.len(), 2);
            }
            other => panic!("unexpected advisories: {other:?}"),
        }
        assert_eq!(sim.journal_matching("link.lane_info tx_jesd").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_status_reads_no_lanes() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();
        run_until(&mut ctx, FramerStatusStage::NAME).await.unwrap();

        FramerStatusStage.execute(&mut ctx).await.unwrap();
        assert!(ctx.advisories().is_empty());
        assert!(sim.journal_matching("link.lane_info").is_empty());
    }
}
