//! Platform transport collaborator.

use crate::errors::DriverResult;

/// Opens the register/SPI/GPIO transport shared by every other driver.
pub trait Platform: Send {
    /// Opens the transport.
    fn init(&mut self) -> DriverResult<Box<dyn PlatformSession>>;
}

/// An open platform transport.
pub trait PlatformSession: Send {
    /// Closes the transport.
    fn shutdown(&mut self) -> DriverResult<()>;
}
