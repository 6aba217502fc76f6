//! Paint primitives.
//!
//! The harness only needs a clear color today; colors are straight-alpha RGBA
//! in `[0, 1]`, matching what `glClearColor` expects.

mod color;

pub use color::Color;
