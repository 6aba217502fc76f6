//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! the code it drives: the `App` callbacks, render configuration, and the
//! `RenderLoop` state machine that implements `App` over any `GlBackend`.

mod app;
mod config;
mod render_loop;

pub use app::{App, AppControl};
pub use config::{RenderConfig, ShaderSource};
pub use render_loop::{LoopState, RenderLoop};
