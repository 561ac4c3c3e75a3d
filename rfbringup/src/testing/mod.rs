//! Testing utilities for bring-up runs.
//!
//! This module provides:
//! - A simulated board with a call journal and fault injection
//! - Fixtures building configurations, firmware and contexts
//! - Mock stages and tracked resources for pipeline tests
//! - Assertions over journals, releases and events

mod assertions;
mod board;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_event_sequence, assert_in_order, assert_no_event, assert_released_in_reverse,
};
pub use board::SimulatedBoard;
pub use fixtures::{
    run_until, test_config, test_context, test_context_with, test_context_with_sink,
    test_firmware, TEST_FIRMWARE_LEN,
};
pub use mocks::{
    AcquiringStage, FailingStage, RecordingStage, ReleaseLog, SlowStage, TrackedResource,
};
