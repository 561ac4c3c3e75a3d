//! RF, gain, calibration, SYSREF and data-path settings.

use crate::core::{CalibrationMask, ControlPinChannel, GainTarget, TxChannel};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// RF local-oscillator frequencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfConfig {
    /// Receive LO frequency in Hz.
    pub rx_lo_hz: u64,
    /// Transmit LO frequency in Hz.
    pub tx_lo_hz: u64,
    /// Sniffer LO frequency in Hz.
    pub sniffer_lo_hz: u64,
    /// Delay between programming the LOs and checking their lock.
    pub pll_settle_ms: u64,
}

impl Default for RfConfig {
    fn default() -> Self {
        Self {
            rx_lo_hz: 2_500_000_000,
            tx_lo_hz: 2_500_000_000,
            sniffer_lo_hz: 2_600_000_000,
            pll_settle_ms: 200,
        }
    }
}

impl RfConfig {
    /// PLL settle delay as a duration.
    #[must_use]
    pub const fn pll_settle(&self) -> Duration {
        Duration::from_millis(self.pll_settle_ms)
    }
}

/// Gain or attenuation control-pin assignment of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPinSetting {
    /// Channel the pins control.
    pub channel: ControlPinChannel,
    /// Increment step.
    #[serde(default)]
    pub inc_step: u8,
    /// Decrement step.
    #[serde(default)]
    pub dec_step: u8,
    /// GPIO used for increment.
    #[serde(default)]
    pub inc_pin: u8,
    /// GPIO used for decrement.
    #[serde(default)]
    pub dec_pin: u8,
    /// Pin control enabled.
    #[serde(default)]
    pub enable: bool,
}

impl ControlPinSetting {
    /// Pin control disabled for `channel`.
    #[must_use]
    pub const fn disabled(channel: ControlPinChannel) -> Self {
        Self {
            channel,
            inc_step: 0,
            dec_step: 0,
            inc_pin: 0,
            dec_pin: 0,
            enable: false,
        }
    }
}

/// Manual gain index for one receive chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualGain {
    /// Receive chain.
    pub target: GainTarget,
    /// Gain table index.
    pub index: u8,
}

/// Attenuation of one transmit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxAttenuation {
    /// Transmit channel.
    pub channel: TxChannel,
    /// Attenuation in milli-dB.
    pub milli_db: u16,
}

/// Control-pin, gain and attenuation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainConfig {
    /// Control-pin assignments, applied before GPIO setup.
    pub control_pins: Vec<ControlPinSetting>,
    /// Manual gains.
    pub manual_gains: Vec<ManualGain>,
    /// Transmit attenuations.
    pub attenuations: Vec<TxAttenuation>,
}

impl Default for GainConfig {
    fn default() -> Self {
        let gains = [
            GainTarget::Rx1,
            GainTarget::Rx2,
            GainTarget::ObsRx1TxLo,
            GainTarget::ObsRx2TxLo,
            GainTarget::SnifferA,
            GainTarget::SnifferB,
            GainTarget::SnifferC,
        ];
        Self {
            control_pins: vec![
                ControlPinSetting::disabled(ControlPinChannel::Rx1Gain),
                ControlPinSetting::disabled(ControlPinChannel::Rx2Gain),
                ControlPinSetting::disabled(ControlPinChannel::Tx1Atten),
                ControlPinSetting::disabled(ControlPinChannel::Tx2Atten),
            ],
            manual_gains: gains
                .into_iter()
                .map(|target| ManualGain { target, index: 255 })
                .collect(),
            attenuations: vec![
                TxAttenuation {
                    channel: TxChannel::Tx1,
                    milli_db: 10_000,
                },
                TxAttenuation {
                    channel: TxChannel::Tx2,
                    milli_db: 10_000,
                },
            ],
        }
    }
}

/// Initialization calibration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Calibrations to run. The external LO-leakage calibration, if present,
    /// runs in a separate pass.
    pub init_mask: CalibrationMask,
    /// Time budget of each calibration pass.
    pub timeout_ms: u64,
    /// Status polling cadence.
    pub poll_interval_ms: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            init_mask: CalibrationMask::default_init(),
            timeout_ms: 60_000,
            poll_interval_ms: 100,
        }
    }
}

impl CalibrationConfig {
    /// Largest accepted calibration budget, ten minutes.
    pub const MAX_TIMEOUT_MS: u64 = 600_000;

    /// Calibration timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Polling cadence as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// SYSREF pulse timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysrefConfig {
    /// Pulses requested during multichip sync.
    pub mcs_pulses: u32,
    /// Delay after each multichip-sync pulse.
    pub mcs_pulse_delay_ms: u64,
    /// Delay after the pulse that starts the transmit link.
    pub tx_pulse_delay_ms: u64,
    /// Delays after each pulse issued once the receive lanes are clocked.
    pub rx_pulse_delays_ms: Vec<u64>,
}

impl Default for SysrefConfig {
    fn default() -> Self {
        Self {
            mcs_pulses: 4,
            mcs_pulse_delay_ms: 1,
            tx_pulse_delay_ms: 1,
            rx_pulse_delays_ms: vec![1, 5],
        }
    }
}

/// Radio-on settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Tracking calibrations enabled before radio-on.
    pub tracking_mask: CalibrationMask,
    /// Delay after radio-on before reading link status.
    pub link_settle_ms: u64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            tracking_mask: CalibrationMask::default_tracking(),
            link_settle_ms: 1000,
        }
    }
}

/// Expected status bitmasks of the verification checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedStatus {
    /// Clock-generation PLL lock, checked before firmware load.
    pub clkpll_lock: u32,
    /// All PLLs locked after RF programming.
    pub rf_pll_lock: u32,
    /// Multichip sync status.
    pub multichip_sync: u32,
    /// Receive framer steady state.
    pub rx_framer: u32,
    /// Observation framer steady state.
    pub orx_framer: u32,
    /// Deframer steady state.
    pub deframer: u32,
}

impl Default for ExpectedStatus {
    fn default() -> Self {
        Self {
            clkpll_lock: 0x01,
            rf_pll_lock: 0x0F,
            multichip_sync: 0x0B,
            rx_framer: 0x3E,
            orx_framer: 0x3E,
            deframer: 0x28,
        }
    }
}

/// Data-path converter and verification-capture settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPathConfig {
    /// DAC core base address.
    pub dac_base: u64,
    /// DAC channel count.
    pub dac_channels: u8,
    /// ADC core base address.
    pub adc_base: u64,
    /// ADC channel count.
    pub adc_channels: u8,
    /// Receive DMA base address.
    pub dma_base: u64,
    /// Memory base address of the capture region.
    pub ddr_base: u64,
    /// Offset of the capture buffer from `ddr_base`.
    pub capture_offset: u64,
    /// Samples captured.
    pub samples: u64,
    /// Bytes per captured sample.
    pub bytes_per_sample: u64,
    /// Delay between converter init and the capture.
    pub settle_ms: u64,
}

impl Default for DataPathConfig {
    fn default() -> Self {
        Self {
            dac_base: 0,
            dac_channels: 4,
            adc_base: 0,
            adc_channels: 4,
            dma_base: 0,
            ddr_base: 0,
            capture_offset: 0x80_0000,
            samples: 16_384,
            bytes_per_sample: 8,
            settle_ms: 1000,
        }
    }
}

impl DataPathConfig {
    /// Destination address of the capture.
    pub fn capture_address(&self) -> Result<u64, ConfigError> {
        self.ddr_base
            .checked_add(self.capture_offset)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "data_path.capture_offset",
                    format!(
                        "{:#x} + {:#x} overflows the address space",
                        self.ddr_base, self.capture_offset
                    ),
                )
            })
    }

    /// Capture length in bytes.
    pub fn capture_length(&self) -> Result<u64, ConfigError> {
        self.samples
            .checked_mul(self.bytes_per_sample)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "data_path.samples",
                    format!(
                        "{} samples of {} bytes overflow the capture length",
                        self.samples, self.bytes_per_sample
                    ),
                )
            })
    }

    /// Checks that the capture buffer fits the address space and is non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let address = self.capture_address()?;
        let length = self.capture_length()?;
        if length == 0 {
            return Err(ConfigError::invalid(
                "data_path.samples",
                "capture length must be non-zero",
            ));
        }
        if address.checked_add(length).is_none() {
            return Err(ConfigError::invalid(
                "data_path.ddr_base",
                format!("capture of {length} bytes at {address:#x} runs past the address space"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_defaults() {
        let gain = GainConfig::default();
        assert_eq!(gain.control_pins.len(), 4);
        assert_eq!(gain.manual_gains.len(), 7);
        assert!(gain.manual_gains.iter().all(|g| g.index == 255));
        assert_eq!(gain.attenuations[1].milli_db, 10_000);
    }

    #[test]
    fn test_capture_geometry() {
        let data = DataPathConfig {
            ddr_base: 0x1000_0000,
            ..DataPathConfig::default()
        };
        assert_eq!(data.capture_address().unwrap(), 0x1080_0000);
        assert_eq!(data.capture_length().unwrap(), 131_072);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_capture_length_overflow_is_rejected() {
        let data = DataPathConfig {
            samples: 1 << 62,
            bytes_per_sample: 8,
            ..DataPathConfig::default()
        };
        let err = data.capture_length().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "data_path.samples"));
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_capture_address_overflow_is_rejected() {
        let data = DataPathConfig {
            ddr_base: u64::MAX,
            ..DataPathConfig::default()
        };
        let err = data.capture_address().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "data_path.capture_offset"));
    }

    #[test]
    fn test_capture_past_end_of_memory_is_rejected() {
        let data = DataPathConfig {
            ddr_base: u64::MAX - 0x80_0000,
            ..DataPathConfig::default()
        };
        assert!(data.capture_address().is_ok());
        let err = data.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "data_path.ddr_base"));
    }

    #[test]
    fn test_control_pin_partial_json() {
        let pin: ControlPinSetting =
            serde_json::from_str(r#"{"channel": "tx1_atten", "enable": true}"#).unwrap();
        assert_eq!(pin.channel, ControlPinChannel::Tx1Atten);
        assert!(pin.enable);
        assert_eq!(pin.inc_pin, 0);
    }
}
