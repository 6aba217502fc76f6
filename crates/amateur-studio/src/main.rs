use std::path::Path;

use amateur_engine::core::{RenderConfig, RenderLoop, ShaderSource};
use amateur_engine::device::GlInit;
use amateur_engine::logging::{init_logging, LoggingConfig};
use amateur_engine::render::Shape;
use amateur_engine::window::{Runtime, RuntimeConfig};

/// Which mesh to draw. Rebuild to switch.
const SHAPE: Shape = Shape::Rectangle;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig {
        show_delta: true,
        ..Default::default()
    });

    let shaders = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
    let config = RenderConfig {
        shape: SHAPE,
        shaders: ShaderSource::files(shaders),
        // Narrate the first frames step by step (visible with RUST_LOG=debug).
        verbose: true,
        debug_window: 0..3,
        ..Default::default()
    };

    log::info!("starting with {SHAPE}");

    Runtime::run(RuntimeConfig::default(), GlInit::default(), move |gl| {
        RenderLoop::new(gl, config)
    })
    .inspect_err(|e| log::error!("runtime error: {e:#}"))
}
