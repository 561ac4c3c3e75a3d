//! Mock stages and resources for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::BringupContext;
use crate::drivers::DataConverter;
use crate::errors::{BringupError, DriverError, DriverResult};
use crate::resources::ResourceHandle;
use crate::stages::Stage;

/// Release order shared by tracked resources.
pub type ReleaseLog = Arc<Mutex<Vec<String>>>;

/// A resource that appends its name to a [`ReleaseLog`] when released.
#[derive(Debug)]
pub struct TrackedResource {
    name: String,
    log: ReleaseLog,
    fail: bool,
}

impl TrackedResource {
    /// Wraps a tracked resource in a handle.
    #[must_use]
    pub fn handle(name: impl Into<String>, log: &ReleaseLog) -> ResourceHandle {
        Self::build(name.into(), log, false)
    }

    /// Wraps a resource whose release fails after logging.
    #[must_use]
    pub fn failing_handle(name: impl Into<String>, log: &ReleaseLog) -> ResourceHandle {
        Self::build(name.into(), log, true)
    }

    fn build(name: String, log: &ReleaseLog, fail: bool) -> ResourceHandle {
        let resource = Self {
            name: name.clone(),
            log: Arc::clone(log),
            fail,
        };
        ResourceHandle::converter(name, Box::new(resource))
    }
}

impl DataConverter for TrackedResource {
    fn remove(&mut self) -> DriverResult<()> {
        self.log.lock().push(self.name.clone());
        if self.fail {
            Err(DriverError::hardware(-1, format!("{} stuck", self.name)))
        } else {
            Ok(())
        }
    }
}

/// A stage that registers tracked resources and optionally fails afterwards.
#[derive(Debug)]
pub struct AcquiringStage {
    name: String,
    resources: Vec<String>,
    log: ReleaseLog,
    fail: bool,
}

impl AcquiringStage {
    /// Creates a stage registering `resources` in order.
    #[must_use]
    pub fn new(name: impl Into<String>, resources: &[&str], log: &ReleaseLog) -> Self {
        Self {
            name: name.into(),
            resources: resources.iter().map(|r| (*r).to_string()).collect(),
            log: Arc::clone(log),
            fail: false,
        }
    }

    /// Fails after registering every resource.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Stage for AcquiringStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        for resource in &self.resources {
            ctx.register(TrackedResource::handle(resource, &self.log));
        }
        if self.fail {
            return Err(BringupError::resource_init(
                &self.name,
                DriverError::hardware(-1, "simulated failure"),
            ));
        }
        Ok(())
    }
}

/// A stage that always fails with a fresh copy of its error.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    error: DriverError,
}

impl FailingStage {
    /// Creates a stage failing with a device error carrying `message`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: DriverError::hardware(-1, message),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut BringupContext) -> Result<(), BringupError> {
        Err(BringupError::device(self.name.clone(), self.error.clone()))
    }
}

/// A stage that takes time to execute.
#[derive(Debug)]
pub struct SlowStage {
    name: String,
    delay: Duration,
}

impl SlowStage {
    /// Creates a new slow stage.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut BringupContext) -> Result<(), BringupError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// A stage that counts its executions.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    executions: AtomicUsize,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            executions: AtomicUsize::new(0),
        }
    }

    /// Number of times the stage ran.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut BringupContext) -> Result<(), BringupError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
