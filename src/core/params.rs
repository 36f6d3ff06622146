use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParamError;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 500;
pub const DEFAULT_SAMPLE_COUNT: u32 = 16;

/// Which scene the engine should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SceneMode {
    #[default]
    Predefined,
    Random,
}

impl SceneMode {
    /// Control id of the matching radio button
    pub fn control_id(self) -> &'static str {
        match self {
            SceneMode::Predefined => "predefined-scene",
            SceneMode::Random => "random-scene",
        }
    }

    pub fn is_random(self) -> bool {
        self == SceneMode::Random
    }
}

impl FromStr for SceneMode {
    type Err = ParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "predefined-scene" | "predefined" => Ok(SceneMode::Predefined),
            "random-scene" | "random" => Ok(SceneMode::Random),
            other => Err(ParamError::UnknownSelector {
                field: ParamField::SceneMode,
                raw: other.to_string(),
            }),
        }
    }
}

/// How the engine distributes samples inside a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SamplerMode {
    #[default]
    Jittered,
    Uniform,
}

impl SamplerMode {
    pub fn control_id(self) -> &'static str {
        match self {
            SamplerMode::Jittered => "jittered-sampling",
            SamplerMode::Uniform => "uniform-sampling",
        }
    }

    pub fn is_jittered(self) -> bool {
        self == SamplerMode::Jittered
    }
}

impl FromStr for SamplerMode {
    type Err = ParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "jittered-sampling" | "jittered" => Ok(SamplerMode::Jittered),
            "uniform-sampling" | "uniform" => Ok(SamplerMode::Uniform),
            other => Err(ParamError::UnknownSelector {
                field: ParamField::SamplerMode,
                raw: other.to_string(),
            }),
        }
    }
}

/// Individually editable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    Width,
    Height,
    SampleCount,
    SceneMode,
    SamplerMode,
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamField::Width => "width",
            ParamField::Height => "height",
            ParamField::SampleCount => "sample count",
            ParamField::SceneMode => "scene mode",
            ParamField::SamplerMode => "sampler mode",
        };
        f.write_str(name)
    }
}

/// Validated render parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderParameters {
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
    pub scene_mode: SceneMode,
    pub sampler_mode: SamplerMode,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            sample_count: DEFAULT_SAMPLE_COUNT,
            scene_mode: SceneMode::default(),
            sampler_mode: SamplerMode::default(),
        }
    }
}

/// Upper bounds applied on top of the positive-integer rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterLimits {
    pub max_dimension: u32,
    pub max_sample_count: u32,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            max_dimension: 4096,
            max_sample_count: 255,
        }
    }
}

/// Current render parameters, only ever holding valid values
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: RenderParameters,
    limits: ParameterLimits,
}

impl ParameterStore {
    /// Store with default parameters and limits
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ParameterLimits) -> Self {
        Self {
            params: RenderParameters::default(),
            limits,
        }
    }

    /// Build a store from a full parameter set, validating every field
    pub fn from_parameters(
        params: RenderParameters,
        limits: ParameterLimits,
    ) -> Result<Self, ParamError> {
        let mut store = Self::with_limits(limits);
        store.params.width = store.validate(ParamField::Width, params.width)?;
        store.params.height = store.validate(ParamField::Height, params.height)?;
        store.params.sample_count = store.validate(ParamField::SampleCount, params.sample_count)?;
        store.params.scene_mode = params.scene_mode;
        store.params.sampler_mode = params.sampler_mode;
        Ok(store)
    }

    pub fn limits(&self) -> ParameterLimits {
        self.limits
    }

    /// Parse and store one field from its raw control text.
    /// On error the previous value is left untouched.
    pub fn set(&mut self, field: ParamField, raw: &str) -> Result<(), ParamError> {
        match field {
            ParamField::Width => self.params.width = self.parse_number(field, raw)?,
            ParamField::Height => self.params.height = self.parse_number(field, raw)?,
            ParamField::SampleCount => self.params.sample_count = self.parse_number(field, raw)?,
            ParamField::SceneMode => self.params.scene_mode = raw.parse()?,
            ParamField::SamplerMode => self.params.sampler_mode = raw.parse()?,
        }
        Ok(())
    }

    pub fn set_scene_mode(&mut self, mode: SceneMode) {
        self.params.scene_mode = mode;
    }

    pub fn set_sampler_mode(&mut self, mode: SamplerMode) {
        self.params.sampler_mode = mode;
    }

    /// Copy of the current parameters
    pub fn snapshot(&self) -> RenderParameters {
        self.params
    }

    fn parse_number(&self, field: ParamField, raw: &str) -> Result<u32, ParamError> {
        let value = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ParamError::NotANumber {
                field,
                raw: raw.to_string(),
            })?;
        self.validate(field, value)
    }

    fn validate(&self, field: ParamField, value: u32) -> Result<u32, ParamError> {
        let max = match field {
            ParamField::SampleCount => self.limits.max_sample_count,
            _ => self.limits.max_dimension,
        };

        if value == 0 {
            Err(ParamError::NotPositive { field })
        } else if value > max {
            Err(ParamError::AboveLimit { field, value, max })
        } else {
            Ok(value)
        }
    }
}
