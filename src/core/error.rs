use super::params::ParamField;

/// Rejected control-surface input. The store keeps its prior value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("{field} must be a whole number, got {raw:?}")]
    NotANumber { field: ParamField, raw: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: ParamField },

    #[error("{field} must be at most {max}, got {value}")]
    AboveLimit { field: ParamField, value: u32, max: u32 },

    #[error("unknown {field} selector {raw:?}")]
    UnknownSelector { field: ParamField, raw: String },
}

/// Failure reported by, or caught around, the external engine call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine failed: {0}")]
    Failed(String),

    #[error("engine panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("buffer holds {actual} bytes but a {width}x{height} RGBA image needs {expected}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
}

/// Everything that can end an admitted render without an image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
