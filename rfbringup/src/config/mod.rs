//! Bring-up configuration.
//!
//! A [`BringupConfig`] is constructed explicitly for each run and handed to
//! the pipeline; nothing is read from process-wide state. Every field has a
//! default matching the reference board profile, so a partial JSON document
//! only needs to name what differs.

mod backend;
mod firmware;
mod profile;
mod radio;

pub use backend::FpgaBackend;
pub use firmware::Firmware;
pub use profile::{ClockConfig, LinkProfile, LinkRates, LinksConfig, SerdesSettings};
pub use radio::{
    CalibrationConfig, ControlPinSetting, DataPathConfig, ExpectedStatus, GainConfig, ManualGain,
    RadioConfig, RfConfig, SysrefConfig, TxAttenuation,
};

use crate::core::LinkId;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration of one bring-up run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BringupConfig {
    /// FPGA clocking and SerDes backend.
    pub backend: FpgaBackend,
    /// Clock-source device settings.
    pub clock: ClockConfig,
    /// Per-link data profiles.
    pub links: LinksConfig,
    /// RF LO frequencies.
    pub rf: RfConfig,
    /// Control pins, gains and attenuations.
    pub gain: GainConfig,
    /// Initialization calibrations.
    pub calibration: CalibrationConfig,
    /// Tracking calibrations and radio-on.
    pub radio: RadioConfig,
    /// SYSREF pulse timing.
    pub sysref: SysrefConfig,
    /// Expected checkpoint bitmasks.
    pub expected: ExpectedStatus,
    /// Data-path converters and verification capture.
    pub data_path: DataPathConfig,
}

impl BringupConfig {
    /// Creates the reference board configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the FPGA backend.
    #[must_use]
    pub fn with_backend(mut self, backend: FpgaBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the initialization calibration settings.
    #[must_use]
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    /// Sets the expected checkpoint bitmasks.
    #[must_use]
    pub fn with_expected(mut self, expected: ExpectedStatus) -> Self {
        self.expected = expected;
        self
    }

    /// Parses and validates a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for link in LinkId::ALL {
            self.links.get(link).rates(link)?;
        }

        if self.clock.device_clock_hz == 0 {
            return Err(ConfigError::invalid(
                "clock.device_clock_hz",
                "must be non-zero",
            ));
        }

        let cal = &self.calibration;
        if cal.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "calibration.poll_interval_ms",
                "must be non-zero",
            ));
        }
        if cal.timeout_ms > CalibrationConfig::MAX_TIMEOUT_MS {
            return Err(ConfigError::invalid(
                "calibration.timeout_ms",
                format!(
                    "{} ms exceeds the {} ms limit",
                    cal.timeout_ms,
                    CalibrationConfig::MAX_TIMEOUT_MS
                ),
            ));
        }
        if cal.poll_interval_ms > cal.timeout_ms {
            return Err(ConfigError::invalid(
                "calibration.poll_interval_ms",
                format!("{} ms exceeds the {} ms timeout", cal.poll_interval_ms, cal.timeout_ms),
            ));
        }

        if self.sysref.mcs_pulses == 0 {
            return Err(ConfigError::invalid("sysref.mcs_pulses", "must be non-zero"));
        }

        self.data_path.validate()?;

        Ok(())
    }

    /// Derived rates of `link`.
    pub fn link_rates(&self, link: LinkId) -> Result<LinkRates, ConfigError> {
        self.links.get(link).rates(link)
    }
}
