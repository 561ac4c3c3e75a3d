//! FPGA link-layer cores and SerDes lane groups.

use super::Stage;
use crate::context::BringupContext;
use crate::core::LinkId;
use crate::drivers::{LinkParams, SerdesParams, SerdesVariant, TxFraming};
use crate::errors::BringupError;
use crate::resources::{names, ResourceHandle};
use async_trait::async_trait;
use tracing::{debug, info};

/// Initializes the link-layer receivers and the transmitter, one per link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkLayerStage;

impl LinkLayerStage {
    /// Stage name.
    pub const NAME: &'static str = "link-layer";
}

fn link_params(ctx: &BringupContext, link: LinkId) -> LinkParams {
    let profile = ctx.config().links.get(link);
    let rates = ctx.link_rates(link);
    LinkParams {
        name: names::link_core(link),
        link,
        base_address: profile.link_base,
        octets_per_frame: profile.octets_per_frame,
        frames_per_multiframe: profile.frames_per_multiframe,
        subclass: profile.subclass,
        device_clock_khz: rates.device_clock_khz(),
        lane_clock_khz: rates.lane_rate_khz,
    }
}

#[async_trait]
impl Stage for LinkLayerStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        for link in LinkId::ALL {
            let params = link_params(ctx, link);
            let name = params.name.clone();

            let handle = if link.is_receive() {
                let core = ctx
                    .board_mut()
                    .links
                    .init_rx(&params)
                    .map_err(|e| BringupError::resource_init(&name, e))?;
                ResourceHandle::link_rx(&name, core)
            } else {
                let profile = ctx.config().links.get(link);
                let framing = TxFraming {
                    converters: profile.converters,
                    resolution: profile.resolution,
                    bits_per_sample: profile.bits_per_sample,
                    high_density: profile.high_density,
                    control_bits: profile.control_bits,
                };
                let core = ctx
                    .board_mut()
                    .links
                    .init_tx(&params, &framing)
                    .map_err(|e| BringupError::resource_init(&name, e))?;
                ResourceHandle::link_tx(&name, core)
            };
            ctx.register(handle);
            debug!(core = %name, lane_clock_khz = params.lane_clock_khz, "Link core initialized");
        }

        info!("Link-layer cores ready");
        Ok(())
    }
}

/// Initializes one SerDes lane group per link.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdesStage;

impl SerdesStage {
    /// Stage name.
    pub const NAME: &'static str = "serdes-lanes";
}

#[async_trait]
impl Stage for SerdesStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let backend = ctx.config().backend;
        let ref_rate_khz = ctx.config().clock.device_clock_khz();

        for link in LinkId::ALL {
            let profile = ctx.config().links.get(link);
            let params = SerdesParams {
                name: names::serdes(link),
                link,
                tx: !link.is_receive(),
                lane_count: profile.lane_count(),
                lane_rate_khz: ctx.link_rates(link).lane_rate_khz,
                ref_rate_khz,
                variant: SerdesVariant::for_backend(backend, profile),
            };

            let lanes = ctx
                .board_mut()
                .serdes
                .init(&params)
                .map_err(|e| BringupError::resource_init(&params.name, e))?;
            ctx.register(ResourceHandle::serdes(&params.name, lanes));
            debug!(lanes = %params.name, lane_count = params.lane_count, "Lane group initialized");
        }

        info!(%backend, "SerDes lanes ready");
        Ok(())
    }
}
