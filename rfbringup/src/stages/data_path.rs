//! Data-path converters and the end-to-end capture.

use super::Stage;
use crate::context::BringupContext;
use crate::drivers::{ConverterParams, DmaParams};
use crate::errors::{BringupError, DriverError};
use crate::resources::{names, ResourceHandle};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Initializes the DAC and ADC cores, then captures a bounded block of
/// receive samples into memory as a data-path check.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataPathStage;

impl DataPathStage {
    /// Stage name.
    pub const NAME: &'static str = "data-path";
}

#[async_trait]
impl Stage for DataPathStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let config = ctx.config().data_path.clone();
        let invalidate = ctx.config().backend.requires_cache_invalidate();

        let dac = ctx
            .board_mut()
            .data_path
            .init_dac(&ConverterParams {
                name: names::TX_DAC.into(),
                base_address: config.dac_base,
                channels: config.dac_channels,
            })
            .map_err(|e| BringupError::resource_init(names::TX_DAC, e))?;
        ctx.register(ResourceHandle::converter(names::TX_DAC, dac));

        let adc = ctx
            .board_mut()
            .data_path
            .init_adc(&ConverterParams {
                name: names::RX_ADC.into(),
                base_address: config.adc_base,
                channels: config.adc_channels,
            })
            .map_err(|e| BringupError::resource_init(names::RX_ADC, e))?;
        ctx.register(ResourceHandle::converter(names::RX_ADC, adc));

        tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;

        let dma = ctx
            .board_mut()
            .data_path
            .init_dma(&DmaParams {
                name: names::RX_DMA.into(),
                base_address: config.dma_base,
            })
            .map_err(|e| BringupError::resource_init(names::RX_DMA, e))?;
        ctx.register(ResourceHandle::dma(names::RX_DMA, dma));

        let address = config.capture_address()?;
        let length = config.capture_length()?;
        let transfer_error = |source: DriverError| BringupError::Transfer {
            resource: names::RX_DMA.to_string(),
            length,
            source,
        };

        let channel = ctx.dma(names::RX_DMA)?;
        channel.transfer(address, length).map_err(transfer_error)?;
        if invalidate {
            channel
                .invalidate_cache(address, length)
                .map_err(transfer_error)?;
        }

        info!(address, length, "Capture complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FpgaBackend;
    use crate::errors::ErrorKind;
    use crate::testing::{test_config, test_context, test_context_with, SimulatedBoard};
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_capture_into_ddr() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();

        DataPathStage.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.live_names(), vec!["tx_dac", "rx_adc", "rx_dma"]);
        assert_eq!(
            sim.journal_matching("dma."),
            vec![
                "dma.init rx_dma",
                "dma.transfer rx_dma 0x800000 131072",
                "dma.invalidate rx_dma 0x800000 131072",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fpll_backend_skips_cache_invalidate() {
        let sim = SimulatedBoard::new();
        let config = test_config().with_backend(FpgaBackend::A10Fpll);
        let mut ctx = test_context_with(&sim, config).unwrap();

        DataPathStage.execute(&mut ctx).await.unwrap();
        assert!(sim.journal_matching("dma.invalidate").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_failure_keeps_channel_registered() {
        let sim = SimulatedBoard::new();
        sim.fail_on("dma.transfer", DriverError::hardware(-1, "descriptor error"));
        let mut ctx = test_context(&sim).unwrap();

        let err = DataPathStage.execute(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferError);
        assert!(ctx.live_names().contains(&"rx_dma".to_string()));
    }
}
