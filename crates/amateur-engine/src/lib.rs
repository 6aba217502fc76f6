//! Amateur engine crate.
//!
//! This crate owns the OpenGL resource lifecycle (shader programs, vertex and
//! element buffers, vertex array bindings), the render-loop state machine that
//! sequences them each frame, and the winit/glutin runtime that drives it.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod diagnostics;
pub mod render;
pub mod paint;
