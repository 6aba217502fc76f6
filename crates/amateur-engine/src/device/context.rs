use std::num::NonZeroU32;

use anyhow::{anyhow, Context, Result};
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use super::{GlInit, GlowBackend};

/// Owns the window, its GL surface and the current GL context.
///
/// This type is the low-level presentation context:
/// - creates the window together with a matching framebuffer config
/// - creates the context and makes it current on the calling thread
/// - resizes the surface and swaps buffers
///
/// Field order is drop order: surface, then context, then the window they were created for.
pub struct GlContext {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
    size: PhysicalSize<u32>,
}

impl GlContext {
    /// Creates a window + current GL context and loads the GL function table.
    ///
    /// The returned backend is bound to the calling thread.
    pub fn new(
        event_loop: &ActiveEventLoop,
        attributes: WindowAttributes,
        init: &GlInit,
    ) -> Result<(Self, GlowBackend)> {
        let template = ConfigTemplateBuilder::new().with_alpha_size(init.alpha_bits);

        // glutin reports display errors as `Box<dyn Error>`, which is not `Send`.
        let (window, config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, template, pick_config)
            .map_err(|e| anyhow!("failed to create GL display: {e}"))?;

        let window = window.context("GL display builder did not create a window")?;
        let raw_handle = window
            .window_handle()
            .context("window has no native handle")?
            .as_raw();

        let display = config.display();
        let (major, minor) = init.version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .with_debug(init.debug_context)
            .build(Some(raw_handle));

        // SAFETY: `raw_handle` belongs to `window`, which outlives the context (field order).
        let not_current = unsafe { display.create_context(&config, &context_attributes) }
            .with_context(|| format!("failed to create OpenGL {major}.{minor} core context"))?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .context("failed to describe window surface")?;

        // SAFETY: as above, the surface is dropped before the window.
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .context("failed to create window surface")?;

        let context = not_current
            .make_current(&surface)
            .context("failed to make OpenGL context current")?;

        if init.vsync {
            if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
                log::warn!("vsync unavailable: {e}");
            }
        }

        // SAFETY: the context was made current on this thread just above.
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name))
        };

        // SAFETY: same thread, and the runtime drops the backend before this context.
        let backend = unsafe { GlowBackend::new(gl) };

        let size = window.inner_size();
        Ok((
            Self {
                surface,
                context,
                window,
                size,
            },
            backend,
        ))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Resizes the surface.
    ///
    /// A 0x0 surface cannot be configured; in that case only the stored size
    /// is updated and the surface keeps its previous extent.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;

        let (Some(width), Some(height)) =
            (NonZeroU32::new(new_size.width), NonZeroU32::new(new_size.height))
        else {
            return;
        };

        self.surface.resize(&self.context, width, height);
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&self) -> Result<()> {
        self.window.pre_present_notify();
        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")
    }
}

/// Prefers the config with the most samples; ties keep the driver's order.
///
/// glutin-winit only calls the picker after `find_configs` returned at least
/// one config, and the picker has no way to fail.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    most_samples(configs, |config| config.num_samples())
        .expect("GL display offered no framebuffer configs")
}

fn most_samples<T>(items: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    items.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}
