//! Tests for the bring-up context.

#[cfg(test)]
mod tests {
    use crate::checkpoint::Checkpoint;
    use crate::core::{Advisory, CheckKind, LinkId};
    use crate::errors::{BringupError, ConfigError, ErrorKind};
    use crate::events::CollectingEventSink;
    use crate::testing::{
        test_config, test_context, test_context_with, test_context_with_sink, ReleaseLog,
        SimulatedBoard, TrackedResource,
    };
    use std::sync::Arc;

    #[test]
    fn test_context_derives_rates_up_front() {
        let sim = SimulatedBoard::new();
        let ctx = test_context(&sim).unwrap();

        for link in LinkId::ALL {
            assert_eq!(ctx.link_rates(link), test_config().link_rates(link).unwrap());
        }
        assert_eq!(ctx.live_handles(), 0);
        assert!(sim.journal().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_hardware() {
        let sim = SimulatedBoard::new();
        let mut config = test_config();
        config.sysref.mcs_pulses = 0;

        let err = test_context_with(&sim, config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(sim.journal().is_empty());
    }

    #[test]
    fn test_register_emits_acquired_event() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        let log = ReleaseLog::default();

        ctx.begin_stage("acquire", 1);
        ctx.register(TrackedResource::handle("a", &log));
        ctx.register(TrackedResource::handle("b", &log));

        assert_eq!(ctx.finish_stage(), vec!["a", "b"]);
        assert_eq!(ctx.live_names(), vec!["a", "b"]);
        assert_eq!(sink.count_of("resource.acquired"), 2);

        let payloads = sink.payloads_of("resource.acquired");
        assert_eq!(payloads[0]["run_id"], ctx.run_id().to_string());
        assert_eq!(payloads[0]["stage"], "acquire");
    }

    #[test]
    fn test_missing_handle_is_an_error() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();

        let err = ctx.transceiver().err().expect("expected missing-handle error");
        assert_eq!(err.kind(), ErrorKind::Internal);

        let log = ReleaseLog::default();
        ctx.register(TrackedResource::handle("adc", &log));
        assert!(ctx.synth("adc").is_err());
    }

    #[test]
    fn test_fatal_checkpoint_halts() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();
        let checkpoint = Checkpoint::new("lock", CheckKind::PllLock, 0x0F);

        let err = ctx.verify(&checkpoint, 0x07).unwrap_err();
        assert!(matches!(
            err,
            BringupError::LockTimeout {
                observed: 0x07,
                expected: 0x0F,
                ..
            }
        ));
        assert!(ctx.advisories().is_empty());
    }

    #[test]
    fn test_advisory_checkpoint_continues() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        let checkpoint = Checkpoint::multichip_sync(&ctx.config().expected);

        ctx.verify(&checkpoint, 0x03).unwrap();
        ctx.verify(&checkpoint, 0x0B).unwrap();

        assert_eq!(ctx.advisories().len(), 1);
        assert!(matches!(
            &ctx.advisories()[0],
            Advisory::CheckpointMismatch { snapshot } if snapshot.observed == 0x03
        ));
        assert_eq!(sink.count_of("checkpoint.mismatch"), 1);
        assert_eq!(sink.count_of("checkpoint.passed"), 1);
    }

    #[test]
    fn test_teardown_is_lifo_and_idempotent() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        let log = ReleaseLog::default();

        for name in ["a", "b", "c"] {
            ctx.register(TrackedResource::handle(name, &log));
        }

        let report = ctx.teardown();
        assert!(report.is_clean());
        assert_eq!(report.released, vec!["c", "b", "a"]);
        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
        assert_eq!(sink.count_of("teardown.completed"), 1);

        let second = ctx.teardown();
        assert_eq!(second.attempted(), 0);
        assert_eq!(log.lock().len(), 3);
        assert_eq!(sink.count_of("teardown.completed"), 1);
    }

    #[test]
    fn test_teardown_continues_past_failed_release() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();
        let log = ReleaseLog::default();

        ctx.register(TrackedResource::handle("a", &log));
        ctx.register(TrackedResource::failing_handle("b", &log));
        ctx.register(TrackedResource::handle("c", &log));

        let report = ctx.teardown();
        assert_eq!(report.released, vec!["c", "a"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].resource, "b");
        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn test_dropped_context_releases_live_handles() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        let log = ReleaseLog::default();

        ctx.register(TrackedResource::handle("a", &log));
        ctx.register(TrackedResource::handle("b", &log));
        drop(ctx);

        assert_eq!(*log.lock(), vec!["b", "a"]);
        assert_eq!(sink.count_of("resource.released"), 2);
        assert_eq!(sink.count_of("teardown.completed"), 1);
    }

    #[test]
    fn test_drop_after_teardown_releases_nothing_twice() {
        let sim = SimulatedBoard::new();
        let sink = Arc::new(CollectingEventSink::new());
        let mut ctx = test_context_with_sink(&sim, sink.clone()).unwrap();
        let log = ReleaseLog::default();

        ctx.register(TrackedResource::handle("a", &log));
        ctx.teardown();
        drop(ctx);

        assert_eq!(*log.lock(), vec!["a"]);
        assert_eq!(sink.count_of("teardown.completed"), 1);
    }

    #[test]
    fn test_record_error_keeps_stage_position() {
        let sim = SimulatedBoard::new();
        let mut ctx = test_context(&sim).unwrap();

        ctx.begin_stage("transceiver", 6);
        ctx.record_error(&BringupError::missing("transceiver"));
        ctx.finish_stage();

        let record = ctx.last_error().unwrap();
        assert_eq!(record.stage, "transceiver");
        assert_eq!(record.ordinal, 6);
        assert_eq!(record.kind, ErrorKind::Internal);
    }
}
