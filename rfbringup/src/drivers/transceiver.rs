//! Transceiver device collaborator.

use crate::config::ControlPinSetting;
use crate::core::{CalibrationMask, Framer, GainTarget, ObsRxSource, RfPll, TxChannel};
use crate::errors::DriverResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attaches to the transceiver device over the platform transport.
pub trait TransceiverDriver: Send {
    /// Attaches to the device.
    fn attach(&mut self) -> DriverResult<Box<dyn Transceiver>>;
}

/// Snapshot of the firmware calibration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalibrationStatus {
    /// True while calibrations are still running.
    pub in_progress: bool,
    /// Calibrations completed so far.
    pub completed: CalibrationMask,
    /// Outstanding error flag; zero when clean.
    pub error_flag: u8,
    /// Outstanding error code; zero when clean.
    pub error_code: u8,
}

impl CalibrationStatus {
    /// Returns true if an error flag or code is set.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error_flag != 0 || self.error_code != 0
    }
}

/// Version of the loaded firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Release number.
    pub release: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.release)
    }
}

/// An attached transceiver device.
///
/// Errors from control-pin and GPIO calls are reported as
/// [`DriverError::Gpio`](crate::errors::DriverError::Gpio); everything else
/// as hardware or transport errors.
#[cfg_attr(test, mockall::automock)]
pub trait Transceiver: Send {
    /// Pulses the device reset.
    fn reset(&mut self) -> DriverResult<()>;

    /// Loads the device profile.
    fn initialize(&mut self) -> DriverResult<()>;

    /// Reads the PLL lock bitmask.
    fn check_pll_lock(&mut self) -> DriverResult<u32>;

    /// Enables or latches multichip sync, returning its status bitmask.
    fn enable_multichip_sync(&mut self, enable: bool) -> DriverResult<u32>;

    /// Prepares the embedded processor for a firmware load.
    fn init_firmware_engine(&mut self) -> DriverResult<()>;

    /// Loads the firmware image.
    fn load_firmware(&mut self, image: &[u8]) -> DriverResult<()>;

    /// Reads back the running firmware version.
    fn firmware_version(&mut self) -> DriverResult<FirmwareVersion>;

    /// Programs one RF PLL.
    fn set_rf_frequency(&mut self, pll: RfPll, frequency_hz: u64) -> DriverResult<()>;

    /// Assigns gain or attenuation control pins.
    fn set_control_pin(&mut self, setting: &ControlPinSetting) -> DriverResult<()>;

    /// Applies the GPIO configuration.
    fn setup_gpio(&mut self) -> DriverResult<()>;

    /// Sets a manual gain index.
    fn set_manual_gain(&mut self, target: GainTarget, index: u8) -> DriverResult<()>;

    /// Sets a transmit attenuation.
    fn set_attenuation(&mut self, channel: TxChannel, milli_db: u16) -> DriverResult<()>;

    /// Starts the calibrations in `mask`.
    fn run_calibrations(&mut self, mask: CalibrationMask) -> DriverResult<()>;

    /// Reads the calibration engine status.
    fn poll_calibrations(&mut self) -> DriverResult<CalibrationStatus>;

    /// Aborts running calibrations, returning the ones that completed.
    fn abort_calibrations(&mut self) -> DriverResult<CalibrationMask>;

    /// Gates SYSREF into a framer.
    fn enable_sysref_to_framer(&mut self, framer: Framer, enable: bool) -> DriverResult<()>;

    /// Gates SYSREF into the deframer.
    fn enable_sysref_to_deframer(&mut self, enable: bool) -> DriverResult<()>;

    /// Resets the deframer.
    fn reset_deframer(&mut self) -> DriverResult<()>;

    /// Reads a framer status word.
    fn read_framer_status(&mut self, framer: Framer) -> DriverResult<u32>;

    /// Reads the deframer status word.
    fn read_deframer_status(&mut self) -> DriverResult<u32>;

    /// Enables tracking calibrations.
    fn enable_tracking_calibrations(&mut self, mask: CalibrationMask) -> DriverResult<()>;

    /// Moves the device to the operational state.
    fn radio_on(&mut self) -> DriverResult<()>;

    /// Selects the observation receive source.
    fn set_obs_rx_source(&mut self, source: ObsRxSource) -> DriverResult<()>;

    /// Turns the radio off and holds the device in reset.
    fn shutdown(&mut self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_status_error() {
        let clean = CalibrationStatus::default();
        assert!(!clean.has_error());

        let flagged = CalibrationStatus {
            error_code: 5,
            ..CalibrationStatus::default()
        };
        assert!(flagged.has_error());
    }

    #[test]
    fn test_firmware_version_display() {
        let version = FirmwareVersion {
            major: 5,
            minor: 2,
            release: 0,
        };
        assert_eq!(version.to_string(), "5.2.0");
    }
}
