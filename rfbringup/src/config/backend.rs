//! FPGA backend capability sets.

use crate::core::LinkId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The FPGA family's clocking and SerDes backend.
///
/// Both backends are driven through the same synthesizer and lane-group
/// interfaces; they differ only in the capabilities reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpgaBackend {
    /// AXI clock generators with GT transceivers.
    #[default]
    AxiClkgen,
    /// A10 fractional PLLs with reconfigurable transceivers.
    A10Fpll,
}

impl FpgaBackend {
    /// Returns true if a synthesizer must be disabled around a rate change.
    #[must_use]
    pub const fn gates_rate_change(self) -> bool {
        matches!(self, Self::A10Fpll)
    }

    /// Returns true if SerDes lane clocks need an explicit enable.
    #[must_use]
    pub const fn requires_serdes_clock_enable(self) -> bool {
        matches!(self, Self::AxiClkgen)
    }

    /// Returns true if the CPU data cache must be invalidated after a DMA
    /// transfer into memory.
    #[must_use]
    pub const fn requires_cache_invalidate(self) -> bool {
        matches!(self, Self::AxiClkgen)
    }

    /// Name of the device-clock synthesizer serving `link`.
    #[must_use]
    pub fn synth_name(self, link: LinkId) -> String {
        match self {
            Self::AxiClkgen => format!("{link}_clkgen"),
            Self::A10Fpll => format!("{link}_device_clk_pll"),
        }
    }
}

impl fmt::Display for FpgaBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AxiClkgen => write!(f, "axi_clkgen"),
            Self::A10Fpll => write!(f, "a10_fpll"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(!FpgaBackend::AxiClkgen.gates_rate_change());
        assert!(FpgaBackend::AxiClkgen.requires_serdes_clock_enable());
        assert!(FpgaBackend::AxiClkgen.requires_cache_invalidate());

        assert!(FpgaBackend::A10Fpll.gates_rate_change());
        assert!(!FpgaBackend::A10Fpll.requires_serdes_clock_enable());
        assert!(!FpgaBackend::A10Fpll.requires_cache_invalidate());
    }

    #[test]
    fn test_synth_names() {
        assert_eq!(FpgaBackend::AxiClkgen.synth_name(LinkId::ObsRx), "rx_os_clkgen");
        assert_eq!(FpgaBackend::A10Fpll.synth_name(LinkId::Tx), "tx_device_clk_pll");
    }
}
