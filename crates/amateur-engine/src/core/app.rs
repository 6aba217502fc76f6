use anyhow::Result;

use crate::input::{InputFrame, InputState};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the runtime.
///
/// Callback order: `load` once after the context exists, then per frame
/// `update` followed by `render`, and `unload` once at shutdown. `resize` may
/// arrive between frames.
pub trait App {
    /// One-time setup. An error ends the run before the first frame.
    fn load(&mut self) -> Result<()>;

    /// Drawable size changed (physical pixels).
    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Per-frame input handling.
    fn update(&mut self, input: &InputState, frame: &InputFrame) -> AppControl;

    /// Per-frame drawing. `present` swaps the back buffer and must be called at most once.
    fn render(&mut self, present: impl FnOnce() -> Result<()>) -> Result<()>;

    /// Releases GPU resources. Called once, while the context is still current.
    fn unload(&mut self);
}
