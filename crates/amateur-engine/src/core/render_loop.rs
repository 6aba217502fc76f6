use anyhow::{bail, Context, Result};

use crate::device::{GlBackend, HandleKind, HandleLedger, Primitive};
use crate::diagnostics::DebugChannel;
use crate::input::{InputFrame, InputState, Key};
use crate::render::{GeometryBuffer, ShaderProgram};
use crate::time::{oscillate, FrameClock};

use super::app::{App, AppControl};
use super::config::RenderConfig;

/// Observable lifecycle state of a `RenderLoop`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Unloaded,
    Loaded,
    /// Close observed; no further frames are drawn.
    Closing,
    Finished,
}

/// Everything `load` creates. Only exists while loaded, so per-frame code
/// never checks for a missing program or geometry.
struct Scene<G: GlBackend> {
    program: ShaderProgram<G>,
    geometry: GeometryBuffer<G>,
    pulse: Option<G::UniformLocation>,
    clock: FrameClock,
    debug: DebugChannel,
}

enum Stage<G: GlBackend> {
    Unloaded,
    Loaded(Scene<G>),
    Closing(Scene<G>),
    Finished,
}

/// Drives one shape through load → (update, render)* → unload.
///
/// Exclusively owns the backend and every GPU resource it creates.
pub struct RenderLoop<G: GlBackend> {
    gl: G,
    config: RenderConfig,
    stage: Stage<G>,
    frame_count: u64,
    ledger: HandleLedger,
}

impl<G: GlBackend> RenderLoop<G> {
    pub fn new(gl: G, config: RenderConfig) -> Self {
        Self {
            gl,
            config,
            stage: Stage::Unloaded,
            frame_count: 0,
            ledger: HandleLedger::new(),
        }
    }

    /// Completed renders since load. Never reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn state(&self) -> LoopState {
        match self.stage {
            Stage::Unloaded => LoopState::Unloaded,
            Stage::Loaded(_) => LoopState::Loaded,
            Stage::Closing(_) => LoopState::Closing,
            Stage::Finished => LoopState::Finished,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn backend(&self) -> &G {
        &self.gl
    }

    pub fn ledger(&self) -> &HandleLedger {
        &self.ledger
    }

    pub fn geometry(&self) -> Option<&GeometryBuffer<G>> {
        self.scene().map(|s| &s.geometry)
    }

    pub fn program(&self) -> Option<&ShaderProgram<G>> {
        self.scene().map(|s| &s.program)
    }

    fn scene(&self) -> Option<&Scene<G>> {
        match &self.stage {
            Stage::Loaded(scene) | Stage::Closing(scene) => Some(scene),
            Stage::Unloaded | Stage::Finished => None,
        }
    }

    fn build_scene(&mut self) -> Result<Scene<G>> {
        let debug = DebugChannel::install(&mut self.gl, self.config.debug);

        let gl = &self.gl;
        let shape = self.config.shape;

        gl.clear_color(self.config.clear_color);

        let geometry = shape
            .upload(gl)
            .with_context(|| format!("failed to upload {shape} geometry"))?;
        track_geometry(&mut self.ledger, &geometry);

        let program = self
            .config
            .shaders
            .read()
            .and_then(|(vs, fs)| {
                ShaderProgram::compile(gl, &vs, &fs).context("failed to build shader program")
            });
        let program = match program {
            Ok(program) => program,
            Err(e) => {
                log::error!("load aborted: {e:#}");
                release_geometry(&mut self.ledger, &geometry);
                geometry.destroy(gl);
                return Err(e);
            }
        };
        self.ledger.track(HandleKind::Program, &program.handle());

        let pulse = self
            .config
            .pulse_uniform
            .as_deref()
            .and_then(|name| program.uniform_location(gl, name));

        log::info!(
            "loaded {shape}: {} vertices, {} draw count, pulse uniform {}",
            geometry.vertex_count(),
            geometry.draw_count(),
            if pulse.is_some() { "bound" } else { "unused" }
        );

        Ok(Scene {
            program,
            geometry,
            pulse,
            clock: FrameClock::new(),
            debug,
        })
    }
}

impl<G: GlBackend> App for RenderLoop<G> {
    /// Builds the scene and checks the backend reported nothing fatal while doing so.
    ///
    /// A shader that fails to compile or link is fatal: there is nothing to draw with.
    fn load(&mut self) -> Result<()> {
        if !matches!(self.stage, Stage::Unloaded) {
            bail!("render loop cannot load from {:?}", self.state());
        }

        let scene = self.build_scene()?;
        let fault = scene.debug.check();
        self.stage = Stage::Loaded(scene);

        fault.context("graphics backend reported an error during load")
    }

    fn resize(&mut self, width: u32, height: u32) {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        self.gl.viewport(0, 0, width, height);
    }

    /// Closes on a window close request or Escape. A tap that was pressed and
    /// released between two frames only shows up in `frame`.
    fn update(&mut self, input: &InputState, frame: &InputFrame) -> AppControl {
        match self.stage {
            Stage::Loaded(_) => {}
            Stage::Unloaded => return AppControl::Continue,
            Stage::Closing(_) | Stage::Finished => return AppControl::Exit,
        }

        let escape = input.key_down(Key::Escape) || frame.keys_pressed.contains(&Key::Escape);
        if !(input.close_requested || escape) {
            return AppControl::Continue;
        }

        log::info!("close requested after {} frames", self.frame_count);
        if let Stage::Loaded(scene) = std::mem::replace(&mut self.stage, Stage::Finished) {
            self.stage = Stage::Closing(scene);
        }
        AppControl::Exit
    }

    /// clear → bind → pulse → draw → present.
    ///
    /// Inside the debug window with `verbose` set, every step is logged before
    /// and after it runs. Outside `Loaded` this does nothing.
    fn render(&mut self, present: impl FnOnce() -> Result<()>) -> Result<()> {
        let Self {
            gl,
            config,
            stage,
            frame_count,
            ..
        } = self;
        let Stage::Loaded(scene) = stage else {
            return Ok(());
        };
        let gl = &*gl;

        let frame = *frame_count;
        let verbose = config.verbose && config.debug_window.contains(&frame);
        let time = scene.clock.tick();

        narrate(verbose, frame, "clear", || gl.clear_color_buffer());
        narrate(verbose, frame, "bind program", || scene.program.bind(gl))?;
        if let Some(location) = &scene.pulse {
            let pulse = oscillate(time.elapsed);
            narrate(verbose, frame, "set pulse", || {
                scene.program.set_uniform_f32(gl, location, pulse)
            });
        }
        narrate(verbose, frame, "draw", || {
            scene.geometry.draw(gl, Primitive::Triangles)
        });
        narrate(verbose, frame, "present", present).context("present failed")?;

        scene
            .debug
            .check()
            .with_context(|| format!("graphics backend reported an error in frame {frame}"))?;

        *frame_count += 1;
        Ok(())
    }

    /// Disposes the program and reports what is still alive. Idempotent.
    fn unload(&mut self) {
        let scene = match std::mem::replace(&mut self.stage, Stage::Finished) {
            Stage::Loaded(scene) | Stage::Closing(scene) => scene,
            Stage::Unloaded | Stage::Finished => return,
        };

        let Scene {
            mut program, debug, ..
        } = scene;

        if program.dispose(&self.gl) {
            self.ledger.release(HandleKind::Program, &program.handle());
        }

        let leaks = self.ledger.report();
        log::info!(
            "unloaded after {} frames ({} debug messages, {leaks} leaked handles)",
            self.frame_count,
            debug.received()
        );
    }
}

impl<G: GlBackend> Drop for RenderLoop<G> {
    fn drop(&mut self) {
        if self.scene().is_some() {
            self.unload();
        }
    }
}

fn narrate<R>(verbose: bool, frame: u64, step: &str, f: impl FnOnce() -> R) -> R {
    if verbose {
        log::debug!("frame {frame}: {step}...");
    }
    let out = f();
    if verbose {
        log::debug!("frame {frame}: {step} done");
    }
    out
}

fn track_geometry<G: GlBackend>(ledger: &mut HandleLedger, geometry: &GeometryBuffer<G>) {
    ledger.track(HandleKind::VertexArray, &geometry.vertex_array());
    ledger.track(HandleKind::Buffer, &geometry.vertex_buffer());
    if let Some(ebo) = geometry.element_buffer() {
        ledger.track(HandleKind::Buffer, &ebo);
    }
}

fn release_geometry<G: GlBackend>(ledger: &mut HandleLedger, geometry: &GeometryBuffer<G>) {
    ledger.release(HandleKind::VertexArray, &geometry.vertex_array());
    ledger.release(HandleKind::Buffer, &geometry.vertex_buffer());
    if let Some(ebo) = geometry.element_buffer() {
        ledger.release(HandleKind::Buffer, &ebo);
    }
}
