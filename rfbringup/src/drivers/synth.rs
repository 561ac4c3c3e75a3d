//! FPGA frequency-synthesizer collaborator.

use crate::errors::DriverResult;

/// Initialization parameters of one device-clock synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthParams {
    /// Instance name.
    pub name: String,
    /// Core base address.
    pub base_address: u64,
    /// Reference input rate in Hz.
    pub parent_rate_hz: u64,
}

/// Creates synthesizer instances.
pub trait SynthDriver: Send {
    /// Initializes one synthesizer.
    fn init(&mut self, params: &SynthParams) -> DriverResult<Box<dyn FrequencySynth>>;
}

/// A live synthesizer instance.
///
/// Both FPGA backends implement this interface; the fPLL variant needs
/// [`disable`](Self::disable) and [`enable`](Self::enable) around a rate
/// change, the clkgen variant does not.
pub trait FrequencySynth: Send {
    /// Programs the output rate.
    fn set_rate(&mut self, rate_hz: u64) -> DriverResult<()>;

    /// Enables the output.
    fn enable(&mut self) -> DriverResult<()>;

    /// Disables the output.
    fn disable(&mut self) -> DriverResult<()>;

    /// Releases the instance.
    fn remove(&mut self) -> DriverResult<()>;
}
