//! Platform transport and clock-source stages.

use super::Stage;
use crate::context::BringupContext;
use crate::core::{Advisory, BringupEvent};
use crate::errors::BringupError;
use crate::resources::{names, ResourceHandle};
use async_trait::async_trait;
use tracing::{info, warn};

/// Opens the platform transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformStage;

impl PlatformStage {
    /// Stage name.
    pub const NAME: &'static str = "platform";
}

#[async_trait]
impl Stage for PlatformStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let session = ctx
            .board_mut()
            .platform
            .init()
            .map_err(|source| BringupError::Platform { source })?;
        ctx.register(ResourceHandle::platform(names::PLATFORM, session));
        info!("Platform transport ready");
        Ok(())
    }
}

/// Resets and configures the clock-source device.
///
/// Programming the outputs is best effort: the external reference may be
/// absent, so a failure becomes an advisory and the run continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockSourceStage;

impl ClockSourceStage {
    /// Stage name.
    pub const NAME: &'static str = "clock-source";
    const RESOURCE: &'static str = "clock_source";
}

#[async_trait]
impl Stage for ClockSourceStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, ctx: &mut BringupContext) -> Result<(), BringupError> {
        let config = ctx.config().clock.clone();
        let clock = &mut ctx.board_mut().clock;

        clock
            .reset()
            .map_err(|e| BringupError::resource_init(Self::RESOURCE, e))?;
        clock
            .configure(&config)
            .map_err(|e| BringupError::resource_init(Self::RESOURCE, e))?;

        match clock.program() {
            Ok(()) => info!(device_clock_hz = config.device_clock_hz, "Clock source programmed"),
            Err(err) => {
                warn!(error = %err, "Clock source programming failed, continuing");
                ctx.emit(
                    BringupEvent::new("clock.program_failed")
                        .add_data("error", serde_json::json!(err.to_string())),
                );
                ctx.advise(Advisory::ClockProgramming {
                    message: err.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::MockClockSource;
    use crate::errors::{DriverError, ErrorKind};
    use crate::testing::{test_context, SimulatedBoard};

    #[tokio::test]
    async fn test_platform_registers_session() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();

        PlatformStage.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.live_names(), vec!["platform"]);
    }

    #[tokio::test]
    async fn test_platform_failure_leaves_nothing_live() {
        let sim = SimulatedBoard::new();
        sim.fail_on("platform.init", DriverError::transport("no SPI bus"));
        let mut ctx = test_context(&sim).unwrap();

        let err = PlatformStage.execute(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformError);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_clock_program_failure_is_advisory() {
        let sim = SimulatedBoard::new();
        sim.fail_on("clock.program", DriverError::hardware(-1, "no reference"));
        let mut ctx = test_context(&sim).unwrap();

        ClockSourceStage.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.advisories().len(), 1);
        assert!(matches!(ctx.advisories()[0], Advisory::ClockProgramming { .. }));
    }

    #[tokio::test]
    async fn test_clock_reset_failure_is_fatal() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();

        let mut clock = MockClockSource::new();
        clock
            .expect_reset()
            .times(1)
            .returning(|| Err(DriverError::hardware(-2, "spi timeout")));
        clock.expect_configure().never();
        clock.expect_program().never();
        ctx.board_mut().clock = Box::new(clock);

        let err = ClockSourceStage.execute(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceInitError);
        assert!(err.to_string().starts_with("clock_source"));
    }

    #[tokio::test]
    async fn test_clock_sequence() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();

        let mut seq = mockall::Sequence::new();
        let mut clock = MockClockSource::new();
        clock.expect_reset().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        clock
            .expect_configure()
            .withf(|config| config.device_clock_hz == 122_880_000)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        clock.expect_program().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        ctx.board_mut().clock = Box::new(clock);

        ClockSourceStage.execute(&mut ctx).await.unwrap();
        assert!(ctx.advisories().is_empty());
    }
}
