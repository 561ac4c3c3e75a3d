//! Core domain model types for the bring-up orchestrator.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Resource kinds and stage status
//! - Link, RF path and device block identifiers
//! - Calibration masks
//! - Advisory records and status snapshots
//! - Lifecycle events

mod advisory;
mod event;
mod ids;
mod mask;
mod status;

pub use advisory::{Advisory, CheckKind, LaneInfo, LinkReport, LinkStatusSnapshot};
pub use event::BringupEvent;
pub use ids::{ControlPinChannel, Framer, GainTarget, LinkId, ObsRxSource, RfPll, TxChannel};
pub use mask::CalibrationMask;
pub use status::{ResourceKind, StageStatus};
