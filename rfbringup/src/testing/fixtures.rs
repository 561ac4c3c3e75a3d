//! Test fixtures for bring-up runs.

use std::sync::Arc;

use super::SimulatedBoard;
use crate::config::{BringupConfig, Firmware};
use crate::context::BringupContext;
use crate::errors::{BringupError, ConfigError};
use crate::events::EventSink;
use crate::stages::standard_stages;

/// Size of the generated firmware image.
pub const TEST_FIRMWARE_LEN: usize = 4096;

/// The reference board configuration.
#[must_use]
pub fn test_config() -> BringupConfig {
    BringupConfig::default()
}

/// A small deterministic firmware image.
#[must_use]
pub fn test_firmware() -> Firmware {
    let bytes: Vec<u8> = (0u8..=250).cycle().take(TEST_FIRMWARE_LEN).collect();
    Firmware::from_bytes("test-m3.bin", bytes)
}

/// A context over `sim` with the reference configuration.
pub fn test_context(sim: &SimulatedBoard) -> Result<BringupContext, ConfigError> {
    test_context_with(sim, test_config())
}

/// A context over `sim` with `config`.
pub fn test_context_with(
    sim: &SimulatedBoard,
    config: BringupConfig,
) -> Result<BringupContext, ConfigError> {
    BringupContext::new(config, sim.board(), test_firmware())
}

/// A context over `sim` reporting to `sink`.
pub fn test_context_with_sink(
    sim: &SimulatedBoard,
    sink: Arc<dyn EventSink>,
) -> Result<BringupContext, ConfigError> {
    Ok(test_context(sim)?.with_sink(sink))
}

/// Executes the standard stages that precede `stage`.
///
/// Stages run directly, without the pipeline's bookkeeping, so a test can
/// exercise one stage against a board in the state it expects.
pub async fn run_until(ctx: &mut BringupContext, stage: &str) -> Result<(), BringupError> {
    for next in standard_stages() {
        if next.name() == stage {
            break;
        }
        next.execute(ctx).await?;
    }
    Ok(())
}
