use std::fmt;

use crate::device::GlBackend;

use super::geometry::{GeometryBuffer, GeometryError, VertexLayout};

/// Built-in meshes. Both use interleaved `[x, y, z, r, g, b]` vertices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Shape {
    /// Three vertices, non-indexed; red, green and blue corners.
    #[default]
    Triangle,
    /// Four corners drawn as two indexed triangles.
    Rectangle,
}

#[rustfmt::skip]
const TRIANGLE_VERTICES: [f32; 18] = [
    // position          color
    -0.5, -0.5, 0.0,     1.0, 0.0, 0.0,
     0.5, -0.5, 0.0,     0.0, 1.0, 0.0,
     0.0,  0.5, 0.0,     0.0, 0.0, 1.0,
];

#[rustfmt::skip]
const RECTANGLE_VERTICES: [f32; 24] = [
    // position          color
     0.5,  0.5, 0.0,     1.0, 0.0, 0.0, // top right
     0.5, -0.5, 0.0,     0.0, 1.0, 0.0, // bottom right
    -0.5, -0.5, 0.0,     0.0, 0.0, 1.0, // bottom left
    -0.5,  0.5, 0.0,     1.0, 1.0, 0.0, // top left
];

const RECTANGLE_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

impl Shape {
    pub fn vertices(self) -> &'static [f32] {
        match self {
            Shape::Triangle => &TRIANGLE_VERTICES,
            Shape::Rectangle => &RECTANGLE_VERTICES,
        }
    }

    pub fn indices(self) -> Option<&'static [u32]> {
        match self {
            Shape::Triangle => None,
            Shape::Rectangle => Some(&RECTANGLE_INDICES),
        }
    }

    /// Position at location 0, color at location 1.
    pub fn layout() -> VertexLayout {
        VertexLayout::packed(&[(0, 3), (1, 3)])
    }

    pub fn upload<G: GlBackend>(self, gl: &G) -> Result<GeometryBuffer<G>, GeometryError> {
        GeometryBuffer::init(gl, self.vertices(), self.indices(), Self::layout())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Triangle => "TRIANGLE",
            Shape::Rectangle => "RECTANGLE",
        })
    }
}
