//! Pipeline builder with validation.

use super::{Pipeline, STANDARD_PIPELINE};
use crate::errors::PipelineValidationError;
use crate::stages::{standard_stages, Stage};
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// The stages, in execution order.
    stages: Vec<Arc<dyn Stage>>,
    /// Names already taken.
    names: HashSet<String>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// A builder holding the fourteen standard bring-up stages.
    #[must_use]
    pub fn standard() -> Self {
        let mut builder = Self::new(STANDARD_PIPELINE);
        for stage in standard_stages() {
            builder.names.insert(stage.name().to_string());
            builder.stages.push(stage);
        }
        builder
    }

    /// Appends a stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already used.
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Result<Self, PipelineValidationError> {
        let name = stage.name().to_string();
        if name.trim().is_empty() {
            return Err(PipelineValidationError::new("Stage name cannot be empty"));
        }
        if !self.names.insert(name.clone()) {
            return Err(
                PipelineValidationError::new(format!("Stage '{name}' is defined twice"))
                    .with_stages(vec![name]),
            );
        }

        self.stages.push(stage);
        Ok(self)
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages"));
        }

        Ok(Pipeline::new(self.name, self.stages))
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
}
