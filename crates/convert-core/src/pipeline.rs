//! Pipeline orchestrator: input plugin, transforms, output plugin.
//!
//! The pipeline runs in three phases:
//!   Phase 1: Input plugin → BookDocument
//!   Phase 2: Transforms, in insertion order
//!   Phase 3: Output plugin → target file

use std::path::Path;

use log::info;

use crate::error::{ConvertError, Result};
use crate::options::ConversionOptions;
use crate::plugin::{InputPlugin, OutputPlugin, Transform};

/// The conversion pipeline orchestrator.
pub struct Pipeline {
    input_plugin: Box<dyn InputPlugin>,
    output_plugin: Box<dyn OutputPlugin>,
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new(input_plugin: Box<dyn InputPlugin>, output_plugin: Box<dyn OutputPlugin>) -> Self {
        Self {
            input_plugin,
            output_plugin,
            transforms: Vec::new(),
        }
    }

    /// Transforms are applied in the order they are added.
    pub fn add_transform(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Run the full conversion pipeline.
    pub fn run(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &ConversionOptions,
    ) -> Result<()> {
        // Phase 1: Input
        info!("Running {} input plugin...", self.input_plugin.name());
        let mut book = self.input_plugin.convert(input_path, options)?;
        info!(
            "Input parsed: {} manifest items, {} spine items",
            book.manifest.len(),
            book.spine.len()
        );

        // Phase 2: Transforms
        for transform in &self.transforms {
            if !transform.should_run(options) {
                info!("Skipping transform: {}", transform.name());
                continue;
            }

            info!("Running transform: {}", transform.name());
            transform.apply(&mut book, options).map_err(|e| {
                ConvertError::Pipeline(format!("Transform '{}' failed: {}", transform.name(), e))
            })?;
        }

        // Phase 3: Output
        info!("Running {} output plugin...", self.output_plugin.name());
        self.output_plugin.convert(&book, output_path, options)?;

        info!("Output written to {}", output_path.display());
        Ok(())
    }
}

/// Builder for constructing a pipeline.
#[derive(Default)]
pub struct PipelineBuilder {
    input_plugin: Option<Box<dyn InputPlugin>>,
    output_plugin: Option<Box<dyn OutputPlugin>>,
    transforms: Vec<Box<dyn Transform>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, plugin: Box<dyn InputPlugin>) -> Self {
        self.input_plugin = Some(plugin);
        self
    }

    pub fn output(mut self, plugin: Box<dyn OutputPlugin>) -> Self {
        self.output_plugin = Some(plugin);
        self
    }

    pub fn transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let input_plugin = self
            .input_plugin
            .ok_or_else(|| ConvertError::Pipeline("No input plugin specified".to_string()))?;
        let output_plugin = self
            .output_plugin
            .ok_or_else(|| ConvertError::Pipeline("No output plugin specified".to_string()))?;

        let mut pipeline = Pipeline::new(input_plugin, output_plugin);
        for t in self.transforms {
            pipeline.add_transform(t);
        }
        Ok(pipeline)
    }
}
