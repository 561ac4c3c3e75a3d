//! LIFO teardown of live handles.

use super::ResourceHandle;
use crate::errors::ReleaseFailure;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Outcome of draining a teardown stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    /// Handles released cleanly, in release order.
    pub released: Vec<String>,
    /// Releases that failed, in release order.
    pub failures: Vec<ReleaseFailure>,
}

impl TeardownReport {
    /// Returns true if every release succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every handle a release was attempted on, in release order.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.released.len() + self.failures.len()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.released.extend(other.released);
        self.failures.extend(other.failures);
    }
}

/// The ordered record of live handles.
///
/// Handles are pushed in acquisition order and released in reverse.
#[derive(Debug, Default)]
pub struct TeardownStack {
    handles: Vec<ResourceHandle>,
}

impl TeardownStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a live handle.
    pub fn push(&mut self, handle: ResourceHandle) {
        debug!(resource = %handle.name(), kind = %handle.kind(), "Resource live");
        self.handles.push(handle);
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if no handle is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns true if a handle named `name` is live.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handles.iter().any(|h| h.name() == name)
    }

    /// Names of live handles, bottom to top.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.name().to_string()).collect()
    }

    /// Looks up a live handle by name.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut ResourceHandle> {
        self.handles.iter_mut().find(|h| h.name() == name)
    }

    /// Releases every live handle, most recent first.
    ///
    /// Never fails: release errors and panics are collected in the report and
    /// the remaining handles are still released. Draining an empty stack
    /// returns an empty report.
    pub fn drain(&mut self) -> TeardownReport {
        self.drain_with(|_, _| {})
    }

    /// Like [`drain`](Self::drain), calling `observe` after each release
    /// with the handle name and the failure, if any.
    pub fn drain_with<F>(&mut self, mut observe: F) -> TeardownReport
    where
        F: FnMut(&str, Option<&ReleaseFailure>),
    {
        let mut report = TeardownReport::default();

        while let Some(handle) = self.handles.pop() {
            let name = handle.name().to_string();
            let kind = handle.kind();

            match catch_unwind(AssertUnwindSafe(|| handle.release())) {
                Ok(Ok(())) => {
                    debug!(resource = %name, "Released");
                    observe(&name, None);
                    report.released.push(name);
                }
                Ok(Err(err)) => {
                    warn!(resource = %name, error = %err, "Release failed");
                    let failure = ReleaseFailure {
                        resource: name,
                        kind,
                        message: err.to_string(),
                    };
                    observe(&failure.resource, Some(&failure));
                    report.failures.push(failure);
                }
                Err(panic) => {
                    let message = format!("release panicked: {}", panic_message(panic.as_ref()));
                    warn!(resource = %name, "{}", message);
                    let failure = ReleaseFailure {
                        resource: name,
                        kind,
                        message,
                    };
                    observe(&failure.resource, Some(&failure));
                    report.failures.push(failure);
                }
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
