//! Symbolic names of the handles registered by a standard run.

use crate::config::FpgaBackend;
use crate::core::LinkId;

/// Platform transport.
pub const PLATFORM: &str = "platform";

/// Transceiver device.
pub const TRANSCEIVER: &str = "transceiver";

/// Transmit DAC core.
pub const TX_DAC: &str = "tx_dac";

/// Receive ADC core.
pub const RX_ADC: &str = "rx_adc";

/// Receive capture DMA channel.
pub const RX_DMA: &str = "rx_dma";

/// Device-clock synthesizer of `link`.
#[must_use]
pub fn synth(backend: FpgaBackend, link: LinkId) -> String {
    backend.synth_name(link)
}

/// Link-layer core of `link`.
#[must_use]
pub fn link_core(link: LinkId) -> String {
    format!("{link}_jesd")
}

/// SerDes lane group of `link`.
#[must_use]
pub fn serdes(link: LinkId) -> String {
    format!("{link}_xcvr")
}
