// cli.rs - Command-line interface configuration
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use crate::core::{
    OrchestratorConfig, ParameterLimits, ParameterStore, RenderParameters, SamplerMode, SceneMode,
    DEFAULT_HEIGHT, DEFAULT_SAMPLE_COUNT, DEFAULT_WIDTH,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "render-orchestrator")]
#[command(about = "Single-flight render front end for a blocking image engine", long_about = None)]
pub struct Cli {
    /// Render once without a window and print the report as JSON
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,

    /// Image width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Samples per pixel
    #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    pub samples: u32,

    #[arg(long, value_enum, default_value_t = SceneMode::Predefined)]
    pub scene: SceneMode,

    #[arg(long, value_enum, default_value_t = SamplerMode::Jittered)]
    pub sampler: SamplerMode,

    /// Milliseconds to wait after painting "in progress" before rendering
    #[arg(long = "yield-ms", default_value_t = 100)]
    pub yield_ms: u64,

    /// Largest accepted width or height
    #[arg(long = "max-dimension", default_value_t = ParameterLimits::default().max_dimension)]
    pub max_dimension: u32,

    /// Largest accepted sample count
    #[arg(long = "max-samples", default_value_t = ParameterLimits::default().max_sample_count)]
    pub max_samples: u32,

    /// Milliseconds the built-in pattern engine blocks per render
    #[arg(long = "engine-work-ms", default_value_t = 0)]
    pub engine_work_ms: u64,
}

impl Cli {
    pub fn parameters(&self) -> RenderParameters {
        RenderParameters {
            width: self.width,
            height: self.height,
            sample_count: self.samples,
            scene_mode: self.scene,
            sampler_mode: self.sampler,
        }
    }

    pub fn limits(&self) -> ParameterLimits {
        ParameterLimits {
            max_dimension: self.max_dimension,
            max_sample_count: self.max_samples,
        }
    }

    /// Startup parameters must be valid; they are not silently replaced
    pub fn parameter_store(&self) -> anyhow::Result<ParameterStore> {
        ParameterStore::from_parameters(self.parameters(), self.limits())
            .context("invalid startup render parameters")
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            yield_delay: Duration::from_millis(self.yield_ms),
        }
    }

    pub fn engine_work(&self) -> Duration {
        Duration::from_millis(self.engine_work_ms)
    }
}
