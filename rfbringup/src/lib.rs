//! # rfbringup
//!
//! Staged bring-up of a multi-chip RF transceiver board.
//!
//! A run takes a clock generator, a transceiver IC, the FPGA-side SerDes and
//! JESD204 link cores, and the DAC/ADC data paths from power-on reset to a
//! streaming radio. It provides:
//!
//! - **Ordered stages**: fourteen bring-up steps executed strictly in order
//! - **Verification checkpoints**: one bitmask check reused for PLL lock,
//!   multichip sync and framer/deframer status, fatal or advisory
//! - **Bounded calibration waits**: polling with a timeout and a mandatory
//!   abort on any non-clean completion
//! - **LIFO teardown**: every acquired handle is released exactly once,
//!   most recent first, on failure or shutdown
//!
//! Hardware is reached only through the collaborator traits in [`drivers`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rfbringup::prelude::*;
//!
//! let config = BringupConfig::from_json_file("board.json")?;
//! let firmware = Firmware::from_file("Mykonos_M3.bin")?;
//! let sink = Arc::new(LoggingEventSink::default());
//!
//! let mut session = bring_up(config, board, firmware, sink).await?;
//! // ... stream samples ...
//! session.shutdown();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod bringup;
pub mod calibration;
pub mod checkpoint;
pub mod config;
pub mod context;
pub mod core;
pub mod drivers;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod resources;
pub mod stages;
pub mod testing;

pub use bringup::{bring_up, bring_up_with, RadioSession};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bringup::{bring_up, bring_up_with, RadioSession};
    pub use crate::checkpoint::{Checkpoint, MatchRule, Severity};
    pub use crate::config::{BringupConfig, Firmware, FpgaBackend};
    pub use crate::context::BringupContext;
    pub use crate::core::{
        Advisory, BringupEvent, CalibrationMask, LinkId, LinkReport, ResourceKind, StageStatus,
    };
    pub use crate::drivers::Board;
    pub use crate::errors::{
        BringupError, ConfigError, DriverError, ErrorKind, PipelineValidationError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat, RunSummary};
    pub use crate::pipeline::{BringupFailure, Pipeline, PipelineBuilder};
    pub use crate::resources::{ResourceHandle, TeardownReport};
    pub use crate::stages::Stage;
}
