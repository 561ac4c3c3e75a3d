//! Identifiers for links, RF paths and device-side blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One independent high-speed data link between the transceiver and the FPGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkId {
    /// Primary receive link.
    Rx,
    /// Transmit link.
    Tx,
    /// Observation receive link.
    ObsRx,
}

impl LinkId {
    /// All links in bring-up order.
    pub const ALL: [Self; 3] = [Self::Rx, Self::Tx, Self::ObsRx];

    /// Short name used to build resource names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rx => "rx",
            Self::Tx => "tx",
            Self::ObsRx => "rx_os",
        }
    }

    /// Returns true for links carrying data from the transceiver to the FPGA.
    #[must_use]
    pub const fn is_receive(self) -> bool {
        matches!(self, Self::Rx | Self::ObsRx)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RF local-oscillator synthesizers inside the transceiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfPll {
    /// Receive LO.
    Rx,
    /// Transmit LO.
    Tx,
    /// Sniffer (observation) LO.
    Sniffer,
}

impl RfPll {
    /// All RF synthesizers in programming order.
    pub const ALL: [Self; 3] = [Self::Rx, Self::Tx, Self::Sniffer];
}

impl fmt::Display for RfPll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx => write!(f, "rx_pll"),
            Self::Tx => write!(f, "tx_pll"),
            Self::Sniffer => write!(f, "sniffer_pll"),
        }
    }
}

/// Device-side framers feeding receive links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framer {
    /// Framer of the primary receive link.
    Rx,
    /// Framer of the observation receive link.
    ObsRx,
}

impl Framer {
    /// The link this framer drives.
    #[must_use]
    pub const fn link(self) -> LinkId {
        match self {
            Self::Rx => LinkId::Rx,
            Self::ObsRx => LinkId::ObsRx,
        }
    }
}

impl fmt::Display for Framer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx => write!(f, "rx_framer"),
            Self::ObsRx => write!(f, "orx_framer"),
        }
    }
}

/// Source selection of the observation receive path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObsRxSource {
    /// Path disabled.
    Off,
    /// ORx1 with transmit LO.
    Orx1TxLo,
    /// ORx2 with transmit LO.
    Orx2TxLo,
    /// Path handed to firmware for internal calibrations.
    InternalCals,
    /// Sniffer input.
    Sniffer,
}

impl fmt::Display for ObsRxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Orx1TxLo => write!(f, "orx1_txlo"),
            Self::Orx2TxLo => write!(f, "orx2_txlo"),
            Self::InternalCals => write!(f, "internal_cals"),
            Self::Sniffer => write!(f, "sniffer"),
        }
    }
}

/// Receive chains with a manual gain setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainTarget {
    /// Receiver 1.
    Rx1,
    /// Receiver 2.
    Rx2,
    /// Observation receiver 1 on transmit LO.
    ObsRx1TxLo,
    /// Observation receiver 2 on transmit LO.
    ObsRx2TxLo,
    /// Sniffer input A.
    SnifferA,
    /// Sniffer input B.
    SnifferB,
    /// Sniffer input C.
    SnifferC,
}

impl fmt::Display for GainTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx1 => write!(f, "rx1"),
            Self::Rx2 => write!(f, "rx2"),
            Self::ObsRx1TxLo => write!(f, "orx1_txlo"),
            Self::ObsRx2TxLo => write!(f, "orx2_txlo"),
            Self::SnifferA => write!(f, "sniffer_a"),
            Self::SnifferB => write!(f, "sniffer_b"),
            Self::SnifferC => write!(f, "sniffer_c"),
        }
    }
}

/// Transmit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxChannel {
    /// Transmitter 1.
    Tx1,
    /// Transmitter 2.
    Tx2,
}

impl fmt::Display for TxChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tx1 => write!(f, "tx1"),
            Self::Tx2 => write!(f, "tx2"),
        }
    }
}

/// Gain or attenuation control pins of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPinChannel {
    /// Receiver 1 gain pins.
    Rx1Gain,
    /// Receiver 2 gain pins.
    Rx2Gain,
    /// Transmitter 1 attenuation pins.
    Tx1Atten,
    /// Transmitter 2 attenuation pins.
    Tx2Atten,
}

impl fmt::Display for ControlPinChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx1Gain => write!(f, "rx1_gain_pin"),
            Self::Rx2Gain => write!(f, "rx2_gain_pin"),
            Self::Tx1Atten => write!(f, "tx1_atten_pin"),
            Self::Tx2Atten => write!(f, "tx2_atten_pin"),
        }
    }
}
