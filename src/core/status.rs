use std::fmt;

/// The one status line shown on the control surface
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderStatus {
    #[default]
    Idle,
    InProgress,
    Completed { elapsed_secs: f64 },
    Failed { reason: String },
}

impl RenderStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, RenderStatus::Failed { .. })
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStatus::Idle => write!(f, "Ready to render."),
            RenderStatus::InProgress => write!(f, "Rendering in progress..."),
            RenderStatus::Completed { elapsed_secs } => {
                write!(f, "Rendering completed in {:.2} seconds.", elapsed_secs)
            }
            RenderStatus::Failed { reason } => write!(f, "Rendering failed: {}", reason),
        }
    }
}
