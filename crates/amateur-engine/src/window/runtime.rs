use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl};
use crate::device::{GlContext, GlInit, GlowBackend};
use crate::input::platform::translate_window_event;
use crate::input::{InputFrame, InputState};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Amateur Hour".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs `App` callbacks until it exits.
    ///
    /// `build` receives the backend once the context is current and returns
    /// the app to drive. A failed load or frame ends the run with that error.
    pub fn run<A, F>(initial: RuntimeConfig, gl_init: GlInit, build: F) -> Result<()>
    where
        A: App + 'static,
        F: FnOnce(GlowBackend) -> A + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gl_init, build);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Live window state. Field order is drop order: the app (and every GL
/// handle it owns) goes before the context it was created on.
struct Active<A> {
    app: A,
    input_state: InputState,
    input_frame: InputFrame,
    context: GlContext,
}

struct AppState<A, F> {
    initial: RuntimeConfig,
    gl_init: GlInit,
    build: Option<F>,

    active: Option<Active<A>>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A, F> AppState<A, F>
where
    A: App + 'static,
    F: FnOnce(GlowBackend) -> A + 'static,
{
    fn new(initial: RuntimeConfig, gl_init: GlInit, build: F) -> Self {
        Self {
            initial,
            gl_init,
            build: Some(build),
            active: None,
            error: None,
            exit_requested: false,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let build = self.build.take().context("app was already started")?;

        let attributes = Window::default_attributes()
            .with_title(self.initial.title.clone())
            .with_inner_size(self.initial.initial_size);

        let (context, backend) = GlContext::new(event_loop, attributes, &self.gl_init)?;

        let mut app = build(backend);
        let PhysicalSize { width, height } = context.size();
        app.resize(width, height);

        if let Err(e) = app.load() {
            app.unload();
            return Err(e.context("load failed"));
        }

        context.window().request_redraw();
        self.active = Some(Active {
            app,
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            context,
        });
        Ok(())
    }

    /// Unloads the app while its context is still alive, then stops the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut active) = self.active.take() {
            active.app.unload();
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        log::error!("{e:#}");
        if self.error.is_none() {
            self.error = Some(e);
        }
        self.shutdown(event_loop);
    }

    /// One `update` + `render` pass. Returns `Ok(false)` when the app asked to exit.
    fn frame(active: &mut Active<A>) -> Result<bool> {
        let control = active
            .app
            .update(&active.input_state, &active.input_frame);
        if control == AppControl::Exit {
            return Ok(false);
        }

        let context = &active.context;
        let rendered = active.app.render(|| context.swap_buffers());

        // Clear per-frame deltas after the frame is consumed.
        active.input_frame.clear();

        rendered.map(|()| true)
    }
}

impl<A, F> ApplicationHandler for AppState<A, F>
where
    A: App + 'static,
    F: FnOnce(GlowBackend) -> A + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.active.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the pulse uniform animates every frame.
        if let Some(active) = &self.active {
            active.context.window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(active) = self.active.as_mut() else {
            return;
        };

        if let Some(ev) = translate_window_event(&event) {
            active.input_state.apply_event(&mut active.input_frame, ev);
        }

        match &event {
            WindowEvent::CloseRequested => {
                // The app observes the request in its next `update`.
                active.context.window().request_redraw();
            }

            WindowEvent::Resized(new_size) => {
                active.context.resize(*new_size);
                active.app.resize(new_size.width, new_size.height);
                active.context.window().request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = active.context.window().inner_size();
                active.context.resize(new_size);
                active.app.resize(new_size.width, new_size.height);
                active.context.window().request_redraw();
            }

            WindowEvent::RedrawRequested => match Self::frame(active) {
                Ok(true) => {}
                Ok(false) => self.shutdown(event_loop),
                Err(e) => self.fail(event_loop, e),
            },

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut active) = self.active.take() {
            active.app.unload();
        }
    }
}
