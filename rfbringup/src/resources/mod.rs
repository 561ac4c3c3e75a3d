//! Resource handles and the teardown stack.

mod handle;
pub mod names;
mod teardown;

pub use handle::{DriverContext, ResourceHandle};
pub use teardown::{TeardownReport, TeardownStack};
