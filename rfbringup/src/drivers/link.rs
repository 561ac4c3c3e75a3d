//! FPGA link-layer collaborator.

use crate::core::{LaneInfo, LinkId};
use crate::errors::DriverResult;

/// Parameters shared by receive and transmit link cores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParams {
    /// Instance name.
    pub name: String,
    /// Link served by the core.
    pub link: LinkId,
    /// Core base address.
    pub base_address: u64,
    /// Octets per frame (F).
    pub octets_per_frame: u8,
    /// Frames per multiframe (K).
    pub frames_per_multiframe: u16,
    /// Link subclass.
    pub subclass: u8,
    /// Device clock in kHz.
    pub device_clock_khz: u64,
    /// Lane clock in kHz.
    pub lane_clock_khz: u64,
}

/// Additional framing parameters of a transmit core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFraming {
    /// Converters per device (M).
    pub converters: u8,
    /// Converter resolution (N).
    pub resolution: u8,
    /// Bits per sample (N').
    pub bits_per_sample: u8,
    /// High density mode.
    pub high_density: bool,
    /// Control bits per sample (CS).
    pub control_bits: u8,
}

/// Creates link-layer core instances.
pub trait LinkDriver: Send {
    /// Initializes a receive core.
    fn init_rx(&mut self, params: &LinkParams) -> DriverResult<Box<dyn DigitalLink>>;

    /// Initializes a transmit core.
    fn init_tx(&mut self, params: &LinkParams, framing: &TxFraming) -> DriverResult<Box<dyn DigitalLink>>;
}

/// A live link-layer core.
pub trait DigitalLink: Send {
    /// Enables the lane clock.
    fn enable_lane_clock(&mut self) -> DriverResult<()>;

    /// Arms the link-loss watchdog of a receive core.
    fn start_watchdog(&mut self) -> DriverResult<()>;

    /// Reads the link status word.
    fn read_status(&mut self) -> DriverResult<u32>;

    /// Number of lanes served by the core.
    fn lane_count(&self) -> u8;

    /// Reads the detail of one lane.
    fn read_lane_info(&mut self, lane: u8) -> DriverResult<LaneInfo>;

    /// Releases the instance.
    fn remove(&mut self) -> DriverResult<()>;
}
