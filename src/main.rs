use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use render_orchestrator::cli::Cli;
use render_orchestrator::core::{
    Clock, ControlEvent, ControlSurfaceAdapter, EventResult, HostContext, ParameterStore,
    PatternEngine, PixelSurface, RenderOrchestrator, RenderOutcome, SurfaceSize,
};
use render_orchestrator::presenter::Presenter;
use render_orchestrator::ui::{CanvasSurface, ControlPanel, LogControlSurface};

const INITIAL_WINDOW_WIDTH: u32 = 1100;
const INITIAL_WINDOW_HEIGHT: u32 = 640;

/// Everything the UI routes events through, built once the window exists
struct Session {
    adapter: ControlSurfaceAdapter,
    orchestrator: RenderOrchestrator<PatternEngine>,
    host: HostContext<ControlPanel, CanvasSurface>,
}

impl Session {
    fn new(cli: &Cli, store: ParameterStore, egui_ctx: egui::Context) -> Self {
        let params = store.snapshot();
        let panel = ControlPanel::new(params, store.limits());
        let canvas = CanvasSurface::new(egui_ctx, SurfaceSize::new(params.width, params.height));

        Self {
            adapter: ControlSurfaceAdapter::new(store),
            orchestrator: RenderOrchestrator::with_config(
                PatternEngine::with_work(cli.engine_work()),
                cli.orchestrator_config(),
            ),
            host: HostContext::new(panel, canvas),
        }
    }

    fn handle(&mut self, events: Vec<ControlEvent>) {
        for event in events {
            let result = self
                .adapter
                .handle(event, &mut self.orchestrator, &mut self.host);
            if let EventResult::Rejected(_) = result {
                self.host.control.sync(self.adapter.store().snapshot());
            }
        }
    }
}

struct App {
    cli: Cli,
    store: Option<ParameterStore>,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    session: Option<Session>,
    clock: Clock,
}

impl App {
    fn new(cli: Cli, store: ParameterStore) -> Self {
        Self {
            cli,
            store: Some(store),
            window: None,
            presenter: None,
            session: None,
            clock: Clock::new(),
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(presenter), Some(session)) =
            (&self.window, &mut self.presenter, &mut self.session)
        else {
            return;
        };

        let delta = self.clock.tick();

        // Blocks the loop for the whole render once the yield turn is over
        session.orchestrator.poll(delta, &mut session.host);

        let mut events = Vec::new();
        let host = &mut session.host;
        let result = presenter.draw(window, |ctx| {
            egui::SidePanel::left("render_settings_panel")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("Render settings");
                    events = host.control.show(ui);
                });
            egui::CentralPanel::default().show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| host.display.show(ui));
            });
        });

        if let Err(e) = result {
            error!("Render error: {}", e);
        }

        session.handle(events);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Render Orchestrator")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let presenter = match pollster::block_on(Presenter::new(window.clone())) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to initialize presenter: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        if let Some(store) = self.store.take() {
            self.session = Some(Session::new(&self.cli, store, presenter.egui_ctx().clone()));
        }

        self.window = Some(window);
        self.presenter = Some(presenter);
        self.clock.reset();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(presenter), Some(window)) = (&mut self.presenter, &self.window) {
            if presenter.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run_headless(cli: &Cli, store: ParameterStore) -> Result<()> {
    let params = store.snapshot();
    let mut host = HostContext::new(
        LogControlSurface::default(),
        PixelSurface::new(params.width, params.height),
    );
    let mut orchestrator = RenderOrchestrator::with_config(
        PatternEngine::with_work(cli.engine_work()),
        cli.orchestrator_config(),
    );
    let mut adapter = ControlSurfaceAdapter::new(store);

    adapter.handle(ControlEvent::RenderTriggered, &mut orchestrator, &mut host);

    // No display pipeline to yield to
    match orchestrator.finish(&mut host).context("render was not admitted")? {
        RenderOutcome::Completed(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        RenderOutcome::Failed { error, .. } => bail!("render failed: {}", error),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let store = cli.parameter_store()?;

    if cli.no_ui {
        return run_headless(&cli, store);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli, store);

    info!("Render Orchestrator - Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
