//! GPU resources for drawing.
//!
//! `ShaderProgram` and `GeometryBuffer` own backend handles and release them
//! explicitly (`dispose` / `destroy`); `Shape` provides the built-in meshes.
//!
//! Convention:
//! - positions are in normalized device coordinates (no transforms).
//! - vertices are interleaved `f32` with position at location 0 and color at location 1.

mod geometry;
mod shader;
mod shape;

pub use geometry::{GeometryBuffer, GeometryError, VertexAttribute, VertexLayout};
pub use shader::{ShaderError, ShaderProgram, StageFailure};
pub use shape::Shape;

/// Built-in position/color shader pair with a `uPulse` brightness uniform.
pub const COLORED_VERT: &str = include_str!("shaders/colored.vert");
pub const COLORED_FRAG: &str = include_str!("shaders/colored.frag");
