//! Clock and per-link data profiles.

use crate::core::LinkId;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings of the board clock-source device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// VCXO frequency in Hz.
    pub vcxo_hz: u64,
    /// Reference input A frequency in Hz.
    pub ref_a_hz: u64,
    /// Device clock output frequency in Hz; parent rate of the FPGA
    /// synthesizers and reference of the SerDes lanes.
    pub device_clock_hz: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            vcxo_hz: 122_880_000,
            ref_a_hz: 30_720_000,
            device_clock_hz: 122_880_000,
        }
    }
}

impl ClockConfig {
    /// Device clock in kHz.
    #[must_use]
    pub const fn device_clock_khz(&self) -> u64 {
        self.device_clock_hz / 1000
    }
}

/// SerDes lane-group settings for one link.
///
/// Which fields apply depends on the selected FPGA backend: the clkgen
/// backend uses the clock selects and equalizer flags, the fPLL backend the
/// reconfiguration block addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerdesSettings {
    /// Transceiver base address.
    pub base_address: u64,
    /// System clock select.
    pub sys_clk_sel: u8,
    /// Output clock select.
    pub out_clk_sel: u8,
    /// Channel PLL enabled.
    pub cpll_enable: bool,
    /// Low-power equalizer mode.
    pub lpm_enable: bool,
    /// Per-lane reconfiguration block addresses.
    pub adxcfg_bases: Vec<u64>,
    /// Transmit PLL base address, if the link owns one.
    pub atx_pll_base: Option<u64>,
}

impl Default for SerdesSettings {
    fn default() -> Self {
        Self {
            base_address: 0,
            sys_clk_sel: 0,
            out_clk_sel: 3,
            cpll_enable: true,
            lpm_enable: true,
            adxcfg_bases: Vec::new(),
            atx_pll_base: None,
        }
    }
}

/// Data profile and framing of one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkProfile {
    /// IQ sample rate in kHz.
    pub iq_rate_khz: u32,
    /// Number of converters carried by the link (M).
    pub converters: u8,
    /// Bitmask of SerDes lanes in use.
    pub lanes_enabled: u8,
    /// Octets per frame (F).
    pub octets_per_frame: u8,
    /// Frames per multiframe (K).
    pub frames_per_multiframe: u16,
    /// Link subclass.
    pub subclass: u8,
    /// Converter resolution in bits (N).
    pub resolution: u8,
    /// Bits per sample (N').
    pub bits_per_sample: u8,
    /// High density mode.
    pub high_density: bool,
    /// Control bits per sample (CS).
    pub control_bits: u8,
    /// Device-clock synthesizer base address.
    pub synth_base: u64,
    /// Link-layer core base address.
    pub link_base: u64,
    /// SerDes lane group.
    pub serdes: SerdesSettings,
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self {
            iq_rate_khz: 122_880,
            converters: 4,
            lanes_enabled: 0x03,
            octets_per_frame: 4,
            frames_per_multiframe: 32,
            subclass: 1,
            resolution: 16,
            bits_per_sample: 16,
            high_density: false,
            control_bits: 0,
            synth_base: 0,
            link_base: 0,
            serdes: SerdesSettings::default(),
        }
    }
}

/// Rates derived from a link profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRates {
    /// Serial lane rate in kHz.
    pub lane_rate_khz: u64,
    /// Lane rate divided by 40, in Hz; the link device clock.
    pub div40_rate_hz: u64,
}

impl LinkRates {
    /// Link-layer device clock in kHz.
    #[must_use]
    pub const fn device_clock_khz(&self) -> u64 {
        self.div40_rate_hz / 1000
    }
}

impl LinkProfile {
    /// Number of lanes in use.
    #[must_use]
    pub const fn lane_count(&self) -> u32 {
        self.lanes_enabled.count_ones()
    }

    /// Derives the lane rate and device clock of this link.
    ///
    /// # Errors
    ///
    /// Returns an error if no lane is enabled or the profile yields a zero
    /// lane rate.
    pub fn rates(&self, link: LinkId) -> Result<LinkRates, ConfigError> {
        let lanes = self.lane_count();
        if lanes == 0 {
            return Err(ConfigError::invalid(
                format!("links.{link}.lanes_enabled"),
                "at least one lane must be enabled",
            ));
        }

        let lane_rate_khz =
            u64::from(self.iq_rate_khz) * u64::from(self.converters) * u64::from(20 / lanes);
        if lane_rate_khz == 0 {
            return Err(ConfigError::invalid(
                format!("links.{link}"),
                "iq_rate_khz and converters must be non-zero",
            ));
        }

        Ok(LinkRates {
            lane_rate_khz,
            div40_rate_hz: lane_rate_khz * (1000 / 40),
        })
    }
}

/// Profiles of all three links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Primary receive link.
    pub rx: LinkProfile,
    /// Transmit link.
    pub tx: LinkProfile,
    /// Observation receive link.
    pub obs_rx: LinkProfile,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            rx: LinkProfile::default(),
            tx: LinkProfile {
                iq_rate_khz: 245_760,
                converters: 4,
                lanes_enabled: 0x0F,
                octets_per_frame: 2,
                resolution: 14,
                control_bits: 2,
                serdes: SerdesSettings {
                    sys_clk_sel: 3,
                    out_clk_sel: 3,
                    cpll_enable: false,
                    lpm_enable: false,
                    ..SerdesSettings::default()
                },
                ..LinkProfile::default()
            },
            obs_rx: LinkProfile {
                iq_rate_khz: 245_760,
                converters: 2,
                lanes_enabled: 0x0C,
                octets_per_frame: 2,
                ..LinkProfile::default()
            },
        }
    }
}

impl LinksConfig {
    /// Returns the profile of `link`.
    #[must_use]
    pub const fn get(&self, link: LinkId) -> &LinkProfile {
        match link {
            LinkId::Rx => &self.rx,
            LinkId::Tx => &self.tx,
            LinkId::ObsRx => &self.obs_rx,
        }
    }
}
