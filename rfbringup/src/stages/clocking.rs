//! Per-link device-clock synthesizers.

use super::Stage;
use crate::context::BringupContext;
use crate::core::LinkId;
use crate::drivers::SynthParams;
use crate::errors::BringupError;
use crate::resources::{names, ResourceHandle};
use async_trait::async_trait;
use tracing::{debug, info};

/// Initializes one synthesizer per link and programs its device clock.
///
/// Each synthesizer is registered as soon as it exists, so a rate failure on
/// one link still tears down its siblings and itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockSynthStage;

impl ClockSynthStage {
    /// Stage name.
    pub const NAME: &'static str = "clock-synthesizers";
}

#[async_trait]
impl Stage for ClockSynthStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let backend = ctx.config().backend;
        let parent_rate_hz = ctx.config().clock.device_clock_hz;

        for link in LinkId::ALL {
            let name = names::synth(backend, link);
            let rate_hz = ctx.link_rates(link).div40_rate_hz;
            let params = SynthParams {
                name: name.clone(),
                base_address: ctx.config().links.get(link).synth_base,
                parent_rate_hz,
            };

            let synth = ctx
                .board_mut()
                .synths
                .init(&params)
                .map_err(|e| BringupError::resource_init(&name, e))?;
            ctx.register(ResourceHandle::synth(&name, synth));

            let synth = ctx.synth(&name)?;
            let programmed = if backend.gates_rate_change() {
                synth
                    .disable()
                    .and_then(|()| synth.set_rate(rate_hz))
                    .and_then(|()| synth.enable())
            } else {
                synth.set_rate(rate_hz)
            };
            programmed.map_err(|e| BringupError::rate_programming(&name, rate_hz, e))?;
            debug!(synth = %name, rate_hz, "Synthesizer programmed");
        }

        info!(%backend, "Device clocks running");
        Ok(())
    }
}
