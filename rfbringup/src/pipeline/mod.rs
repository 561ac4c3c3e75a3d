//! Pipeline building and execution.
//!
//! This module provides:
//! - The pipeline builder with validation
//! - The sequential runner that drives forward execution
//! - Failure reporting with teardown of everything acquired

mod builder;
mod failure;

pub use builder::PipelineBuilder;
pub use failure::{BringupFailure, PREFLIGHT};

use crate::context::BringupContext;
use crate::core::{BringupEvent, StageStatus};
use crate::observability::{RunSummary, SpanTimer, StageRecord};
use crate::stages::{standard_stages, Stage};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Name of the standard bring-up pipeline.
pub const STANDARD_PIPELINE: &str = "rf-bringup";

/// An ordered list of stages.
///
/// Stages run strictly in order, one at a time. The first failure halts
/// forward progress and tears down every live handle, most recent first.
#[derive(Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub(crate) fn new(name: String, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { name, stages }
    }

    /// The fourteen-stage bring-up pipeline.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_PIPELINE.to_string(), standard_stages())
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Runs every stage against `ctx`.
    ///
    /// On success the live handles stay on the context. On failure the
    /// context is torn down before returning.
    pub async fn run(&self, ctx: &mut BringupContext) -> Result<RunSummary, BringupFailure> {
        let timer = SpanTimer::start(&self.name);
        let mut summary = RunSummary::new(ctx.run_id().to_string());

        info!(pipeline = %self.name, stages = self.stages.len(), "Starting bring-up");
        ctx.emit(
            BringupEvent::new("pipeline.started")
                .add_data("pipeline", serde_json::json!(self.name))
                .add_data("stages", serde_json::json!(self.stage_names())),
        );

        for (index, stage) in self.stages.iter().enumerate() {
            let ordinal = index + 1;
            let name = stage.name().to_string();

            ctx.begin_stage(&name, ordinal);
            ctx.emit(BringupEvent::stage_started(&name, ordinal));

            let stage_timer = SpanTimer::start(&name);
            let span = info_span!("stage", name = %name, ordinal);
            let result = stage.execute(ctx).instrument(span).await;
            let duration_ms = stage_timer.finish();

            match result {
                Ok(()) => {
                    let acquired = ctx.finish_stage();
                    info!(stage = %name, ordinal, duration_ms, "Stage completed");
                    ctx.emit(BringupEvent::stage_completed(&name, duration_ms, &acquired));
                    summary.record(StageRecord {
                        name,
                        ordinal,
                        status: StageStatus::Ok,
                        duration_ms,
                        acquired,
                    });
                }
                Err(err) => {
                    ctx.record_error(&err);
                    let acquired = ctx.finish_stage();
                    error!(stage = %name, ordinal, kind = %err.kind(), error = %err, "Stage failed");
                    ctx.emit(BringupEvent::stage_failed(
                        &name,
                        &err.kind().to_string(),
                        &err.to_string(),
                    ));
                    summary.record(StageRecord {
                        name: name.clone(),
                        ordinal,
                        status: StageStatus::Fail,
                        duration_ms,
                        acquired,
                    });

                    let teardown = ctx.teardown();
                    self.finish(ctx, &mut summary, timer, "pipeline.failed");
                    return Err(BringupFailure {
                        stage: name,
                        ordinal,
                        error: err,
                        advisories: ctx.advisories().to_vec(),
                        teardown,
                    });
                }
            }
        }

        self.finish(ctx, &mut summary, timer, "pipeline.completed");
        info!(
            pipeline = %self.name,
            live = summary.live_handles,
            advisories = summary.advisories,
            "Bring-up complete"
        );
        Ok(summary)
    }

    fn finish(
        &self,
        ctx: &BringupContext,
        summary: &mut RunSummary,
        timer: SpanTimer,
        event_type: &str,
    ) {
        summary.advisories = ctx.advisories().len();
        summary.live_handles = ctx.live_handles();
        summary.duration_ms = timer.finish();
        ctx.emit(
            BringupEvent::new(event_type)
                .add_data("pipeline", serde_json::json!(self.name))
                .add_data("summary", summary.to_payload()),
        );
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}
