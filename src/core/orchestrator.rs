use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use serde::Serialize;

use super::adapter::ControlSurfaceAdapter;
use super::decoder::ImageDecoder;
use super::engine::{RawImageBuffer, RenderEngine};
use super::error::{EngineError, RenderError};
use super::params::{ParameterStore, RenderParameters};
use super::surface::{ControlSurface, DisplaySurface, HostContext, SurfaceSize};
use super::timer::Countdown;

/// Delay between admission and the blocking engine call
pub const DEFAULT_YIELD_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Idle,
    Rendering,
}

/// Parameters frozen at admission time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    id: u64,
    params: RenderParameters,
}

impl RenderRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.params.width, self.params.height)
    }
}

/// Result of a render trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted(u64),
    /// A render was already in flight; nothing was queued
    Dropped,
}

/// Timing summary of a successful render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub request_id: u64,
    pub parameters: RenderParameters,
    /// Admission to image written, in seconds
    pub elapsed_secs: f64,
    /// Time spent inside the engine call alone
    pub engine_secs: f64,
    pub buffer_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Completed(RenderReport),
    Failed {
        request: RenderRequest,
        error: RenderError,
    },
}

impl RenderOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RenderOutcome::Completed(_))
    }
}

/// Events the orchestrator reports to the control surface adapter
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNotification {
    Started(RenderRequest),
    Completed(RenderReport),
    Failed {
        request: RenderRequest,
        error: RenderError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub admitted: u64,
    pub dropped: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    /// Minimum wait after the yield turn before the engine call starts
    pub yield_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            yield_delay: DEFAULT_YIELD_DELAY,
        }
    }
}

#[derive(Debug)]
struct PendingRender {
    request: RenderRequest,
    admitted_at: Instant,
    /// Set by the first poll after admission; that poll only yields
    yielded: bool,
    countdown: Countdown,
}

/// Single-flight state machine around a blocking render engine.
///
/// At most one render is in flight. Triggers arriving while `Rendering` are
/// dropped. The engine call is deferred to a later host turn so the
/// "in progress" state is painted before the call blocks the loop.
pub struct RenderOrchestrator<E: RenderEngine> {
    engine: E,
    decoder: ImageDecoder,
    config: OrchestratorConfig,
    state: OrchestratorState,
    pending: Option<PendingRender>,
    next_id: u64,
    stats: RenderStats,
    last_report: Option<RenderReport>,
}

impl<E: RenderEngine> RenderOrchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, OrchestratorConfig::default())
    }

    pub fn with_config(engine: E, config: OrchestratorConfig) -> Self {
        Self {
            engine,
            decoder: ImageDecoder,
            config,
            state: OrchestratorState::Idle,
            pending: None,
            next_id: 1,
            stats: RenderStats::default(),
            last_report: None,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn is_rendering(&self) -> bool {
        self.state == OrchestratorState::Rendering
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn last_report(&self) -> Option<&RenderReport> {
        self.last_report.as_ref()
    }

    pub fn config(&self) -> OrchestratorConfig {
        self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Admit a render of the store's current parameters, or drop the
    /// trigger if one is already in flight.
    pub fn request_render<C, D>(
        &mut self,
        store: &ParameterStore,
        ctx: &mut HostContext<C, D>,
    ) -> Admission
    where
        C: ControlSurface,
        D: DisplaySurface,
    {
        if self.is_rendering() {
            self.stats.dropped += 1;
            debug!("render trigger dropped: request already in flight");
            return Admission::Dropped;
        }

        // Flag first, so a trigger during the yield turn is dropped
        self.state = OrchestratorState::Rendering;

        let request = RenderRequest {
            id: self.next_id,
            params: store.snapshot(),
        };
        self.next_id += 1;
        self.stats.admitted += 1;

        if ctx.display.size() != request.size() {
            debug!(
                "resizing display {:?} to requested {:?}",
                ctx.display.size(),
                request.size()
            );
            ctx.display.resize(request.size());
        }

        info!(
            "render #{} admitted: {}x{}, {} samples, {:?} scene, {:?} sampling",
            request.id,
            request.params.width,
            request.params.height,
            request.params.sample_count,
            request.params.scene_mode,
            request.params.sampler_mode
        );

        ControlSurfaceAdapter::reflect(&RenderNotification::Started(request), &mut ctx.control);

        self.pending = Some(PendingRender {
            request,
            admitted_at: Instant::now(),
            yielded: false,
            countdown: Countdown::new(self.config.yield_delay.as_secs_f32()),
        });

        Admission::Admitted(request.id)
    }

    /// Advance one host turn. Runs the pending render once the yield turn
    /// has passed and the yield delay has run out.
    pub fn poll<C, D>(&mut self, delta: f32, ctx: &mut HostContext<C, D>) -> Option<RenderOutcome>
    where
        C: ControlSurface,
        D: DisplaySurface,
    {
        let pending = self.pending.as_mut()?;

        if !pending.yielded {
            pending.yielded = true;
            pending.countdown.start();
            return None;
        }

        if !pending.countdown.tick(delta) {
            return None;
        }

        self.finish(ctx)
    }

    /// Run the pending render now, without waiting for a yield turn
    pub fn finish<C, D>(&mut self, ctx: &mut HostContext<C, D>) -> Option<RenderOutcome>
    where
        C: ControlSurface,
        D: DisplaySurface,
    {
        let pending = self.pending.take()?;
        let outcome = self.complete(pending, &mut ctx.display);

        self.state = OrchestratorState::Idle;

        let notification = match &outcome {
            RenderOutcome::Completed(report) => {
                self.stats.completed += 1;
                self.last_report = Some(report.clone());
                info!(
                    "render #{} completed in {:.2}s (engine {:.2}s)",
                    report.request_id, report.elapsed_secs, report.engine_secs
                );
                RenderNotification::Completed(report.clone())
            }
            RenderOutcome::Failed { request, error } => {
                self.stats.failed += 1;
                error!("render #{} failed: {}", request.id, error);
                RenderNotification::Failed {
                    request: *request,
                    error: error.clone(),
                }
            }
        };

        ControlSurfaceAdapter::reflect(&notification, &mut ctx.control);

        Some(outcome)
    }

    fn complete<D: DisplaySurface>(&mut self, pending: PendingRender, display: &mut D) -> RenderOutcome {
        let request = pending.request;

        let engine_start = Instant::now();
        let buffer = match self.invoke_engine(&request) {
            Ok(buffer) => buffer,
            Err(e) => {
                return RenderOutcome::Failed {
                    request,
                    error: e.into(),
                }
            }
        };
        let engine_secs = engine_start.elapsed().as_secs_f64();
        let buffer_len = buffer.len();

        // Snapshot dimensions, not the live surface's
        let image = match self
            .decoder
            .decode(buffer, request.params.width, request.params.height)
        {
            Ok(image) => image,
            Err(e) => {
                return RenderOutcome::Failed {
                    request,
                    error: e.into(),
                }
            }
        };

        self.decoder.present(&image, display);

        RenderOutcome::Completed(RenderReport {
            request_id: request.id,
            parameters: request.params,
            elapsed_secs: pending.admitted_at.elapsed().as_secs_f64(),
            engine_secs,
            buffer_len,
        })
    }

    fn invoke_engine(&mut self, request: &RenderRequest) -> Result<RawImageBuffer, EngineError> {
        let params = request.params;
        let engine = &mut self.engine;

        panic::catch_unwind(AssertUnwindSafe(|| {
            engine.render(
                params.width,
                params.height,
                params.sample_count,
                params.scene_mode.is_random(),
                params.sampler_mode.is_jittered(),
            )
        }))
        .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload.as_ref()))))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::RenderStatus;
    use crate::core::surface::PixelSurface;

    #[derive(Default)]
    struct RecordingControl {
        interactive: Vec<bool>,
        statuses: Vec<RenderStatus>,
    }

    impl ControlSurface for RecordingControl {
        fn set_interactive(&mut self, interactive: bool) {
            self.interactive.push(interactive);
        }

        fn set_status(&mut self, status: &RenderStatus) {
            self.statuses.push(status.clone());
        }
    }

    fn solid_engine(
        w: u32,
        h: u32,
        _samples: u32,
        _random: bool,
        _jittered: bool,
    ) -> Result<RawImageBuffer, EngineError> {
        Ok(RawImageBuffer::from_bytes(vec![7; (w * h * 4) as usize]))
    }

    fn small_store() -> ParameterStore {
        let mut store = ParameterStore::new();
        store.set(crate::core::ParamField::Width, "4").unwrap();
        store.set(crate::core::ParamField::Height, "3").unwrap();
        store
    }

    fn context() -> HostContext<RecordingControl, PixelSurface> {
        HostContext::new(RecordingControl::default(), PixelSurface::new(4, 3))
    }

    #[test]
    fn starts_idle() {
        let orchestrator = RenderOrchestrator::new(solid_engine);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
        assert_eq!(orchestrator.stats(), RenderStats::default());
        assert!(orchestrator.last_report().is_none());
    }

    #[test]
    fn admission_locks_and_reports_progress() {
        let mut orchestrator = RenderOrchestrator::new(solid_engine);
        let mut ctx = context();

        let admission = orchestrator.request_render(&small_store(), &mut ctx);

        assert_eq!(admission, Admission::Admitted(1));
        assert!(orchestrator.is_rendering());
        assert_eq!(ctx.control.interactive, vec![false]);
        assert_eq!(ctx.control.statuses, vec![RenderStatus::InProgress]);
    }

    #[test]
    fn poll_yields_before_engine_call() {
        let mut calls = 0;
        let engine = |w: u32, h: u32, _: u32, _: bool, _: bool| -> Result<RawImageBuffer, EngineError> {
            calls += 1;
            Ok(RawImageBuffer::from_bytes(vec![0; (w * h * 4) as usize]))
        };
        let config = OrchestratorConfig {
            yield_delay: Duration::from_millis(100),
        };
        let mut orchestrator = RenderOrchestrator::with_config(engine, config);
        let mut ctx = context();

        orchestrator.request_render(&small_store(), &mut ctx);

        // Yield turn, however long it took
        assert!(orchestrator.poll(10.0, &mut ctx).is_none());
        assert!(orchestrator.poll(0.05, &mut ctx).is_none());
        assert!(orchestrator.is_rendering());

        let outcome = orchestrator.poll(0.06, &mut ctx).unwrap();
        assert!(outcome.is_completed());
        assert!(!orchestrator.is_rendering());
        assert!(orchestrator.poll(1.0, &mut ctx).is_none());

        drop(orchestrator);
        assert_eq!(calls, 1);
    }

    #[test]
    fn finish_completes_and_unlocks() {
        let mut orchestrator = RenderOrchestrator::new(solid_engine);
        let mut ctx = context();

        orchestrator.request_render(&small_store(), &mut ctx);
        let outcome = orchestrator.finish(&mut ctx).unwrap();

        let RenderOutcome::Completed(report) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(report.buffer_len, 4 * 3 * 4);
        assert!(report.elapsed_secs >= report.engine_secs);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
        assert_eq!(ctx.control.interactive, vec![false, true]);
        assert!(matches!(
            ctx.control.statuses.last(),
            Some(RenderStatus::Completed { .. })
        ));
        assert!(ctx.display.pixels().iter().all(|&b| b == 7));
        assert_eq!(orchestrator.stats().completed, 1);
    }

    #[test]
    fn finish_without_pending_is_none() {
        let mut orchestrator = RenderOrchestrator::new(solid_engine);
        let mut ctx = context();
        assert!(orchestrator.finish(&mut ctx).is_none());
        assert!(ctx.control.statuses.is_empty());
    }

    #[test]
    fn busy_trigger_is_dropped() {
        let mut orchestrator = RenderOrchestrator::new(solid_engine);
        let mut ctx = context();
        let store = small_store();

        assert_eq!(orchestrator.request_render(&store, &mut ctx), Admission::Admitted(1));
        assert_eq!(orchestrator.request_render(&store, &mut ctx), Admission::Dropped);
        assert_eq!(orchestrator.stats().dropped, 1);
        assert_eq!(ctx.control.statuses.len(), 1);

        orchestrator.finish(&mut ctx);
        assert_eq!(orchestrator.request_render(&store, &mut ctx), Admission::Admitted(2));
    }

    #[test]
    fn engine_error_fails_without_write() {
        let engine = |_: u32, _: u32, _: u32, _: bool, _: bool| -> Result<RawImageBuffer, EngineError> {
            Err(EngineError::Failed("out of memory".into()))
        };
        let mut orchestrator = RenderOrchestrator::new(engine);
        let mut ctx = context();

        orchestrator.request_render(&small_store(), &mut ctx);
        let outcome = orchestrator.finish(&mut ctx).unwrap();

        assert!(matches!(
            outcome,
            RenderOutcome::Failed {
                error: RenderError::Engine(EngineError::Failed(_)),
                ..
            }
        ));
        assert_eq!(ctx.display.writes(), 0);
        assert_eq!(ctx.control.interactive, vec![false, true]);
        assert!(ctx.control.statuses.last().unwrap().is_failure());
        assert_eq!(orchestrator.stats().failed, 1);
    }

    #[test]
    fn engine_panic_is_caught() {
        let engine = |_: u32, _: u32, _: u32, _: bool, _: bool| -> Result<RawImageBuffer, EngineError> {
            panic!("engine exploded")
        };
        let mut orchestrator = RenderOrchestrator::new(engine);
        let mut ctx = context();

        orchestrator.request_render(&small_store(), &mut ctx);
        let outcome = orchestrator.finish(&mut ctx).unwrap();

        let RenderOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(
            error,
            RenderError::Engine(EngineError::Panicked("engine exploded".into()))
        );
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[test]
    fn wrong_length_takes_failure_path() {
        let engine = |_: u32, _: u32, _: u32, _: bool, _: bool| -> Result<RawImageBuffer, EngineError> {
            Ok(RawImageBuffer::from_bytes(vec![1; 10]))
        };
        let mut orchestrator = RenderOrchestrator::new(engine);
        let mut ctx = context();

        orchestrator.request_render(&small_store(), &mut ctx);
        let outcome = orchestrator.finish(&mut ctx).unwrap();

        assert!(matches!(
            outcome,
            RenderOutcome::Failed {
                error: RenderError::Decode(_),
                ..
            }
        ));
        assert_eq!(ctx.display.writes(), 0);
        assert!(!orchestrator.is_rendering());
    }

    #[test]
    fn admission_resizes_drifted_display() {
        let mut orchestrator = RenderOrchestrator::new(solid_engine);
        let mut ctx = HostContext::new(RecordingControl::default(), PixelSurface::new(1, 1));

        orchestrator.request_render(&small_store(), &mut ctx);
        assert_eq!(ctx.display.size(), SurfaceSize::new(4, 3));
    }

    #[test]
    fn panic_message_handles_both_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
