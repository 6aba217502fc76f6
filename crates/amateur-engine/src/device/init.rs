/// Initialization parameters for the OpenGL layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or driver requirement exists.
#[derive(Debug, Clone)]
pub struct GlInit {
    /// Requested core-profile version as `(major, minor)`.
    ///
    /// 3.3 is the lowest version with explicit attribute locations in GLSL.
    pub version: (u8, u8),

    /// Request a debug context.
    ///
    /// Without it most drivers never invoke the debug callback.
    pub debug_context: bool,

    /// Wait for vertical blank on swap.
    pub vsync: bool,

    /// Minimum alpha channel bits of the framebuffer config.
    pub alpha_bits: u8,
}

impl Default for GlInit {
    fn default() -> Self {
        Self {
            version: (3, 3),
            debug_context: true,
            vsync: true,
            alpha_bits: 8,
        }
    }
}
