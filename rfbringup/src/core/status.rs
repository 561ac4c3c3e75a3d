//! Stage status and resource kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of hardware subsystem a resource handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The register/SPI transport session.
    Platform,
    /// An FPGA-side frequency synthesizer driving a link's device clock.
    ClockPll,
    /// A link-layer receiver.
    LinkRx,
    /// A link-layer transmitter.
    LinkTx,
    /// A group of SerDes lanes serving one link.
    SerdesLaneGroup,
    /// The transceiver device itself.
    TransceiverDevice,
    /// A data-movement engine channel.
    DmaChannel,
    /// A DAC or ADC data-path core.
    DataConverter,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => write!(f, "platform"),
            Self::ClockPll => write!(f, "clock_pll"),
            Self::LinkRx => write!(f, "link_rx"),
            Self::LinkTx => write!(f, "link_tx"),
            Self::SerdesLaneGroup => write!(f, "serdes_lane_group"),
            Self::TransceiverDevice => write!(f, "transceiver_device"),
            Self::DmaChannel => write!(f, "dma_channel"),
            Self::DataConverter => write!(f, "data_converter"),
        }
    }
}

/// Outcome of a stage that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage failed.
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
        }
    }
}
