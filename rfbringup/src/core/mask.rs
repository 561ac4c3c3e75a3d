//! Calibration bitmasks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// A set of transceiver self-calibration routines.
///
/// The same representation names both one-shot initialization calibrations
/// and continuous tracking calibrations; the two bit spaces are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationMask(u32);

impl CalibrationMask {
    /// Empty mask.
    pub const NONE: Self = Self(0);

    // Initialization calibrations.

    /// Transmit baseband filter.
    pub const TX_BB_FILTER: Self = Self(0x0000_0001);
    /// ADC tuner.
    pub const ADC_TUNER: Self = Self(0x0000_0002);
    /// TIA 3 dB corner.
    pub const TIA_3DB_CORNER: Self = Self(0x0000_0004);
    /// DC offset.
    pub const DC_OFFSET: Self = Self(0x0000_0008);
    /// Transmit attenuation delay.
    pub const TX_ATTENUATION_DELAY: Self = Self(0x0000_0010);
    /// Receive gain delay.
    pub const RX_GAIN_DELAY: Self = Self(0x0000_0020);
    /// Flash ADC.
    pub const FLASH_CAL: Self = Self(0x0000_0040);
    /// Path delay.
    pub const PATH_DELAY: Self = Self(0x0000_0080);
    /// Transmit LO leakage, internal loopback.
    pub const TX_LO_LEAKAGE_INTERNAL: Self = Self(0x0000_0100);
    /// Transmit LO leakage through an external path; needs the PA running.
    pub const TX_LO_LEAKAGE_EXTERNAL: Self = Self(0x0000_0200);
    /// Transmit QEC initialization.
    pub const TX_QEC_INIT: Self = Self(0x0000_0400);
    /// Loopback receive LO delay.
    pub const LOOPBACK_RX_LO_DELAY: Self = Self(0x0000_0800);
    /// Loopback receive QEC initialization.
    pub const LOOPBACK_RX_RX_QEC_INIT: Self = Self(0x0000_1000);
    /// Receive LO delay.
    pub const RX_LO_DELAY: Self = Self(0x0000_2000);
    /// Receive QEC initialization.
    pub const RX_QEC_INIT: Self = Self(0x0000_4000);

    // Tracking calibrations.

    /// Rx1 QEC tracking.
    pub const TRACK_RX1_QEC: Self = Self(0x01);
    /// Rx2 QEC tracking.
    pub const TRACK_RX2_QEC: Self = Self(0x02);
    /// ORx1 QEC tracking.
    pub const TRACK_ORX1_QEC: Self = Self(0x04);
    /// ORx2 QEC tracking.
    pub const TRACK_ORX2_QEC: Self = Self(0x08);
    /// Tx1 LO leakage tracking.
    pub const TRACK_TX1_LOL: Self = Self(0x10);
    /// Tx2 LO leakage tracking.
    pub const TRACK_TX2_LOL: Self = Self(0x20);
    /// Tx1 QEC tracking.
    pub const TRACK_TX1_QEC: Self = Self(0x40);
    /// Tx2 QEC tracking.
    pub const TRACK_TX2_QEC: Self = Self(0x80);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if no calibration is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every calibration in `other` is selected.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns this mask with the calibrations in `other` removed.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// The initialization mask of the reference board profile.
    #[must_use]
    pub const fn default_init() -> Self {
        Self(
            Self::TX_BB_FILTER.0
                | Self::ADC_TUNER.0
                | Self::TIA_3DB_CORNER.0
                | Self::DC_OFFSET.0
                | Self::TX_ATTENUATION_DELAY.0
                | Self::RX_GAIN_DELAY.0
                | Self::FLASH_CAL.0
                | Self::PATH_DELAY.0
                | Self::TX_LO_LEAKAGE_INTERNAL.0
                | Self::TX_QEC_INIT.0
                | Self::LOOPBACK_RX_LO_DELAY.0
                | Self::LOOPBACK_RX_RX_QEC_INIT.0
                | Self::RX_LO_DELAY.0
                | Self::RX_QEC_INIT.0,
        )
    }

    /// The tracking mask of the reference board profile.
    #[must_use]
    pub const fn default_tracking() -> Self {
        Self(
            Self::TRACK_ORX1_QEC.0
                | Self::TRACK_ORX2_QEC.0
                | Self::TRACK_RX1_QEC.0
                | Self::TRACK_RX2_QEC.0
                | Self::TRACK_TX1_QEC.0
                | Self::TRACK_TX2_QEC.0,
        )
    }
}

impl BitOr for CalibrationMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CalibrationMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CalibrationMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for CalibrationMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for CalibrationMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for CalibrationMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
