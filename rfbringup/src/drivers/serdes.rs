//! FPGA SerDes lane-group collaborator.

use crate::config::{FpgaBackend, LinkProfile};
use crate::core::LinkId;
use crate::errors::DriverResult;

/// Backend-specific SerDes setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerdesVariant {
    /// GT transceivers behind the clkgen backend.
    Gt {
        /// Transceiver base address.
        base_address: u64,
        /// System clock select.
        sys_clk_sel: u8,
        /// Output clock select.
        out_clk_sel: u8,
        /// Channel PLL enabled.
        cpll_enable: bool,
        /// Low-power equalizer mode.
        lpm_enable: bool,
    },
    /// Reconfigurable transceivers behind the fPLL backend.
    Adxcfg {
        /// Per-lane reconfiguration block addresses.
        lane_bases: Vec<u64>,
        /// Transmit PLL base address.
        atx_pll_base: Option<u64>,
    },
}

impl SerdesVariant {
    /// Builds the variant matching `backend` from a link profile.
    #[must_use]
    pub fn for_backend(backend: FpgaBackend, profile: &LinkProfile) -> Self {
        let serdes = &profile.serdes;
        match backend {
            FpgaBackend::AxiClkgen => Self::Gt {
                base_address: serdes.base_address,
                sys_clk_sel: serdes.sys_clk_sel,
                out_clk_sel: serdes.out_clk_sel,
                cpll_enable: serdes.cpll_enable,
                lpm_enable: serdes.lpm_enable,
            },
            FpgaBackend::A10Fpll => Self::Adxcfg {
                lane_bases: serdes.adxcfg_bases.clone(),
                atx_pll_base: serdes.atx_pll_base,
            },
        }
    }
}

/// Initialization parameters of one lane group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerdesParams {
    /// Instance name.
    pub name: String,
    /// Link served by the lanes.
    pub link: LinkId,
    /// True for the transmit direction.
    pub tx: bool,
    /// Lanes in use.
    pub lane_count: u32,
    /// Lane rate in kHz.
    pub lane_rate_khz: u64,
    /// Reference clock in kHz.
    pub ref_rate_khz: u64,
    /// Backend-specific setup.
    pub variant: SerdesVariant,
}

/// Creates lane-group instances.
pub trait SerdesDriver: Send {
    /// Initializes one lane group.
    fn init(&mut self, params: &SerdesParams) -> DriverResult<Box<dyn SerdesLaneGroup>>;
}

/// A live lane group.
pub trait SerdesLaneGroup: Send {
    /// Enables the lane clocks.
    fn enable_clock(&mut self) -> DriverResult<()>;

    /// Releases the instance.
    fn remove(&mut self) -> DriverResult<()>;
}
