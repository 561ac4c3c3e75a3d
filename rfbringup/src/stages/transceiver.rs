//! Transceiver device stages: firmware, RF synthesis, multichip sync and
//! gain control.

use super::Stage;
use crate::checkpoint::Checkpoint;
use crate::context::BringupContext;
use crate::core::{Advisory, BringupEvent, RfPll};
use crate::errors::BringupError;
use crate::resources::{names, ResourceHandle};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attaches, resets and initializes the transceiver, then loads firmware.
///
/// The firmware engine is only started after the clock-generation PLL
/// reports lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransceiverStage;

impl TransceiverStage {
    /// Stage name.
    pub const NAME: &'static str = "transceiver";
}

#[async_trait]
impl Stage for TransceiverStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let device = ctx
            .board_mut()
            .transceiver
            .attach()
            .map_err(|e| BringupError::resource_init(names::TRANSCEIVER, e))?;
        ctx.register(ResourceHandle::transceiver(names::TRANSCEIVER, device));

        let device = ctx.transceiver()?;
        device
            .reset()
            .map_err(|e| BringupError::device("reset transceiver", e))?;
        device
            .initialize()
            .map_err(|e| BringupError::resource_init(names::TRANSCEIVER, e))?;
        let lock = device
            .check_pll_lock()
            .map_err(|e| BringupError::device("read pll lock", e))?;

        let checkpoint = Checkpoint::clkpll_lock(&ctx.config().expected);
        ctx.verify(&checkpoint, lock)?;

        let firmware = ctx.firmware().clone();
        let device = ctx.transceiver()?;
        device
            .init_firmware_engine()
            .map_err(|e| BringupError::FirmwareLoad {
                reason: format!("firmware engine init failed: {e}"),
            })?;
        device
            .load_firmware(firmware.bytes())
            .map_err(|e| BringupError::FirmwareLoad {
                reason: format!("{}: {e}", firmware.name()),
            })?;

        let sha256 = firmware.sha256();
        info!(image = firmware.name(), bytes = firmware.len(), %sha256, "Firmware loaded");

        match device.firmware_version() {
            Ok(version) => {
                info!(%version, "Firmware version");
                ctx.set_firmware_version(version);
            }
            Err(err) => {
                warn!(error = %err, "Firmware version unavailable");
                ctx.advise(Advisory::FirmwareVersionUnavailable {
                    message: err.to_string(),
                });
            }
        }

        ctx.emit(
            BringupEvent::new("firmware.loaded")
                .add_data("image", serde_json::json!(firmware.name()))
                .add_data("bytes", serde_json::json!(firmware.len()))
                .add_data("sha256", serde_json::json!(sha256))
                .add_data(
                    "version",
                    serde_json::json!(ctx.firmware_version().map(|v| v.to_string())),
                ),
        );
        Ok(())
    }
}

/// Programs every RF LO and re-checks lock across all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RfSynthesisStage;

impl RfSynthesisStage {
    /// Stage name.
    pub const NAME: &'static str = "rf-synthesis";
}

#[async_trait]
impl Stage for RfSynthesisStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let rf = ctx.config().rf.clone();
        let device = ctx.transceiver()?;

        for pll in RfPll::ALL {
            let frequency_hz = match pll {
                RfPll::Rx => rf.rx_lo_hz,
                RfPll::Tx => rf.tx_lo_hz,
                RfPll::Sniffer => rf.sniffer_lo_hz,
            };
            device
                .set_rf_frequency(pll, frequency_hz)
                .map_err(|e| BringupError::rate_programming(pll.to_string(), frequency_hz, e))?;
            debug!(%pll, frequency_hz, "RF LO programmed");
        }

        tokio::time::sleep(rf.pll_settle()).await;

        let lock = ctx
            .transceiver()?
            .check_pll_lock()
            .map_err(|e| BringupError::device("read pll lock", e))?;
        let checkpoint = Checkpoint::rf_pll_lock(&ctx.config().expected);
        ctx.verify(&checkpoint, lock)
    }
}

/// Aligns clock-source and transceiver dividers with SYSREF pulses.
///
/// A sync mismatch is reported but never halts the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultichipSyncStage;

impl MultichipSyncStage {
    /// Stage name.
    pub const NAME: &'static str = "multichip-sync";
}

#[async_trait]
impl Stage for MultichipSyncStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let pulses = ctx.config().sysref.mcs_pulses;
        let delay = Duration::from_millis(ctx.config().sysref.mcs_pulse_delay_ms);

        ctx.transceiver()?
            .enable_multichip_sync(true)
            .map_err(|e| BringupError::device("enable multichip sync", e))?;

        for _ in 0..pulses {
            ctx.board_mut()
                .clock
                .request_sysref()
                .map_err(|e| BringupError::device("request sysref", e))?;
            tokio::time::sleep(delay).await;
        }

        let status = ctx
            .transceiver()?
            .enable_multichip_sync(false)
            .map_err(|e| BringupError::device("latch multichip sync", e))?;
        debug!(pulses, status, "Multichip sync latched");

        let checkpoint = Checkpoint::multichip_sync(&ctx.config().expected);
        ctx.verify(&checkpoint, status)
    }
}

/// Configures control pins, GPIO, manual gains and attenuations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpioGainStage;

impl GpioGainStage {
    /// Stage name.
    pub const NAME: &'static str = "gpio-gain";
}

#[async_trait]
impl Stage for GpioGainStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let gain = ctx.config().gain.clone();
        let device = ctx.transceiver()?;

        for pin in &gain.control_pins {
            device
                .set_control_pin(pin)
                .map_err(|e| BringupError::gpio(format!("configure {}", pin.channel), e))?;
        }
        device
            .setup_gpio()
            .map_err(|e| BringupError::gpio("setup gpio", e))?;

        for setting in &gain.manual_gains {
            device
                .set_manual_gain(setting.target, setting.index)
                .map_err(|e| BringupError::gpio(format!("set {} gain", setting.target), e))?;
        }
        for setting in &gain.attenuations {
            device
                .set_attenuation(setting.channel, setting.milli_db)
                .map_err(|e| {
                    BringupError::gpio(format!("set {} attenuation", setting.channel), e)
                })?;
        }

        info!(
            pins = gain.control_pins.len(),
            gains = gain.manual_gains.len(),
            attenuations = gain.attenuations.len(),
            "Gain control configured"
        );
        Ok(())
    }
}
