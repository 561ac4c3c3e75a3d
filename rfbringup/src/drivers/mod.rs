//! Driver collaborator interfaces.
//!
//! The orchestrator reaches hardware only through these traits. Factory
//! traits (`*Driver`) create instances; each instance trait carries its own
//! release operation and ends up owned by a
//! [`ResourceHandle`](crate::resources::ResourceHandle).
//!
//! All calls are synchronous and report a [`DriverError`](crate::errors::DriverError)
//! on failure; waiting between calls is the orchestrator's job.

mod clock;
mod data_path;
mod link;
mod platform;
mod serdes;
mod synth;
mod transceiver;

pub use clock::ClockSource;
pub use data_path::{ConverterParams, DataConverter, DataPathDriver, DmaChannel, DmaParams};
pub use link::{DigitalLink, LinkDriver, LinkParams, TxFraming};
pub use platform::{Platform, PlatformSession};
pub use serdes::{SerdesDriver, SerdesLaneGroup, SerdesParams, SerdesVariant};
pub use synth::{FrequencySynth, SynthDriver, SynthParams};
pub use transceiver::{CalibrationStatus, FirmwareVersion, Transceiver, TransceiverDriver};

#[cfg(test)]
pub use clock::MockClockSource;
#[cfg(test)]
pub use transceiver::MockTransceiver;

use std::fmt;

/// Every driver collaborator of one board.
pub struct Board {
    /// Platform transport.
    pub platform: Box<dyn Platform>,
    /// Clock-source device.
    pub clock: Box<dyn ClockSource>,
    /// Device-clock synthesizers.
    pub synths: Box<dyn SynthDriver>,
    /// Link-layer cores.
    pub links: Box<dyn LinkDriver>,
    /// SerDes lane groups.
    pub serdes: Box<dyn SerdesDriver>,
    /// Transceiver device.
    pub transceiver: Box<dyn TransceiverDriver>,
    /// Converters and DMA.
    pub data_path: Box<dyn DataPathDriver>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board").finish_non_exhaustive()
    }
}
