//! Clock-source device collaborator.

use crate::config::ClockConfig;
use crate::errors::DriverResult;

/// The board clock generator feeding the transceiver, the FPGA
/// synthesizers and the SYSREF distribution.
///
/// The device is owned by the board rather than by a teardown handle; it
/// stays powered across runs.
#[cfg_attr(test, mockall::automock)]
pub trait ClockSource: Send {
    /// Resets the device.
    fn reset(&mut self) -> DriverResult<()>;

    /// Loads the device profile.
    fn configure(&mut self, config: &ClockConfig) -> DriverResult<()>;

    /// Programs the outputs. May legitimately fail when no external
    /// reference is connected.
    fn program(&mut self) -> DriverResult<()>;

    /// Issues one SYSREF pulse.
    fn request_sysref(&mut self) -> DriverResult<()>;
}
