//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop, creates the window and GL context on resume,
//! and drives an `App` through its callbacks.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
