//! Stage trait and the standard bring-up stages.
//!
//! A stage is one ordered bring-up step. It derives what it needs from the
//! [`BringupContext`], acquires hardware through the board's driver
//! collaborators, registers every handle it creates immediately, runs its
//! checkpoints, and reports success or a typed failure.

mod calibration;
mod clocking;
mod data_path;
mod links;
mod platform;
mod radio;
mod sysref;
mod transceiver;

pub use calibration::InitCalibrationStage;
pub use clocking::ClockSynthStage;
pub use data_path::DataPathStage;
pub use links::{LinkLayerStage, SerdesStage};
pub use platform::{ClockSourceStage, PlatformStage};
pub use radio::RadioOnStage;
pub use sysref::{FramerStatusStage, SysrefEnableStage};
pub use transceiver::{GpioGainStage, MultichipSyncStage, RfSynthesisStage, TransceiverStage};

use crate::context::BringupContext;
use crate::errors::BringupError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for bring-up stages.
///
/// Stages are defined before a run starts and executed exactly once per
/// run, in pipeline order.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The run context, exclusively borrowed for the duration of
    ///   the stage
    ///
    /// # Returns
    ///
    /// `Ok` on success, or the error that halts the run.
    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(&mut BringupContext) -> Result<(), BringupError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut BringupContext) -> Result<(), BringupError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&mut BringupContext) -> Result<(), BringupError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&mut BringupContext) -> Result<(), BringupError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        (self.func)(ctx)
    }
}

/// The fourteen stages of a full bring-up, in execution order.
#[must_use]
pub fn standard_stages() -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(PlatformStage),
        Arc::new(ClockSourceStage),
        Arc::new(ClockSynthStage),
        Arc::new(LinkLayerStage),
        Arc::new(SerdesStage),
        Arc::new(TransceiverStage),
        Arc::new(RfSynthesisStage),
        Arc::new(MultichipSyncStage),
        Arc::new(GpioGainStage),
        Arc::new(InitCalibrationStage),
        Arc::new(SysrefEnableStage),
        Arc::new(FramerStatusStage),
        Arc::new(RadioOnStage),
        Arc::new(DataPathStage),
    ]
}
