use log::{debug, warn};

use super::engine::RenderEngine;
use super::error::ParamError;
use super::orchestrator::{Admission, RenderNotification, RenderOrchestrator};
use super::params::{ParamField, ParameterStore, SamplerMode, SceneMode};
use super::status::RenderStatus;
use super::surface::{ControlSurface, DisplaySurface, HostContext, SurfaceSize};

/// Input coming off the control surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    WidthChanged(String),
    HeightChanged(String),
    SampleCountChanged(String),
    SceneSelected(SceneMode),
    SamplerSelected(SamplerMode),
    RenderTriggered,
}

/// What handling one event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Updated(ParamField),
    Rejected(ParamError),
    Render(Admission),
}

/// Routes control events into the parameter store and orchestrator, and
/// orchestrator notifications back onto the control surface
#[derive(Debug, Clone, Default)]
pub struct ControlSurfaceAdapter {
    store: ParameterStore,
}

impl ControlSurfaceAdapter {
    pub fn new(store: ParameterStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn handle<E, C, D>(
        &mut self,
        event: ControlEvent,
        orchestrator: &mut RenderOrchestrator<E>,
        ctx: &mut HostContext<C, D>,
    ) -> EventResult
    where
        E: RenderEngine,
        C: ControlSurface,
        D: DisplaySurface,
    {
        let (field, raw) = match event {
            ControlEvent::RenderTriggered => {
                return EventResult::Render(orchestrator.request_render(&self.store, ctx));
            }
            ControlEvent::SceneSelected(mode) => {
                self.store.set_scene_mode(mode);
                return EventResult::Updated(ParamField::SceneMode);
            }
            ControlEvent::SamplerSelected(mode) => {
                self.store.set_sampler_mode(mode);
                return EventResult::Updated(ParamField::SamplerMode);
            }
            ControlEvent::WidthChanged(raw) => (ParamField::Width, raw),
            ControlEvent::HeightChanged(raw) => (ParamField::Height, raw),
            ControlEvent::SampleCountChanged(raw) => (ParamField::SampleCount, raw),
        };

        if let Err(e) = self.store.set(field, &raw) {
            warn!("ignoring control input: {}", e);
            return EventResult::Rejected(e);
        }

        // The display follows the dimension inputs
        if matches!(field, ParamField::Width | ParamField::Height) {
            let params = self.store.snapshot();
            let size = SurfaceSize::new(params.width, params.height);
            if ctx.display.size() != size {
                debug!("display resized to {}x{}", size.width, size.height);
                ctx.display.resize(size);
            }
        }

        EventResult::Updated(field)
    }

    /// Mirror an orchestrator notification onto the control surface
    pub fn reflect<C: ControlSurface + ?Sized>(notification: &RenderNotification, control: &mut C) {
        match notification {
            RenderNotification::Started(_) => {
                control.set_interactive(false);
                control.set_status(&RenderStatus::InProgress);
            }
            RenderNotification::Completed(report) => {
                control.set_interactive(true);
                control.set_status(&RenderStatus::Completed {
                    elapsed_secs: report.elapsed_secs,
                });
            }
            RenderNotification::Failed { error, .. } => {
                control.set_interactive(true);
                control.set_status(&RenderStatus::Failed {
                    reason: error.to_string(),
                });
            }
        }
    }
}
