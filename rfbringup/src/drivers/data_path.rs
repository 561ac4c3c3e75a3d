//! Data converter and data movement collaborators.

use crate::errors::DriverResult;

/// Initialization parameters of a DAC or ADC core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterParams {
    /// Instance name.
    pub name: String,
    /// Core base address.
    pub base_address: u64,
    /// Channel count.
    pub channels: u8,
}

/// Initialization parameters of a device-to-memory DMA channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaParams {
    /// Instance name.
    pub name: String,
    /// Core base address.
    pub base_address: u64,
}

/// Creates converter and DMA instances.
pub trait DataPathDriver: Send {
    /// Initializes the DAC core.
    fn init_dac(&mut self, params: &ConverterParams) -> DriverResult<Box<dyn DataConverter>>;

    /// Initializes the ADC core.
    fn init_adc(&mut self, params: &ConverterParams) -> DriverResult<Box<dyn DataConverter>>;

    /// Initializes a DMA channel.
    fn init_dma(&mut self, params: &DmaParams) -> DriverResult<Box<dyn DmaChannel>>;
}

/// A live DAC or ADC core.
pub trait DataConverter: Send {
    /// Releases the instance.
    fn remove(&mut self) -> DriverResult<()>;
}

/// A live DMA channel.
pub trait DmaChannel: Send {
    /// Moves `length` bytes to or from `address` and waits for completion.
    fn transfer(&mut self, address: u64, length: u64) -> DriverResult<()>;

    /// Invalidates the CPU data cache over a memory range.
    fn invalidate_cache(&mut self, address: u64, length: u64) -> DriverResult<()>;

    /// Releases the instance.
    fn remove(&mut self) -> DriverResult<()>;
}
