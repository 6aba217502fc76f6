use std::fmt;

use crate::device::{BufferTarget, BufferUsage, GlBackend, Primitive};

const F32_SIZE: i32 = std::mem::size_of::<f32>() as i32;

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader input location (`layout (location = N)`).
    pub location: u32,
    /// Float components, 1..=4.
    pub components: i32,
    /// Byte offset from the start of the vertex.
    pub offset_bytes: i32,
}

impl VertexAttribute {
    /// First byte past this attribute. Widened so no `i32` input overflows.
    fn end_bytes(&self) -> i64 {
        i64::from(self.offset_bytes) + i64::from(self.components) * i64::from(F32_SIZE)
    }
}

/// Interleaved float vertex layout.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride_bytes: i32,
}

impl VertexLayout {
    pub fn new(attributes: Vec<VertexAttribute>, stride_bytes: i32) -> Self {
        Self {
            attributes,
            stride_bytes,
        }
    }

    /// Tightly packed attributes in declaration order.
    ///
    /// `(location, components)` pairs; offsets and stride follow from the sizes.
    /// Offsets saturate on absurd component counts, which `validate` rejects.
    pub fn packed(attributes: &[(u32, i32)]) -> Self {
        let mut offset = 0;
        let attributes = attributes
            .iter()
            .map(|&(location, components)| {
                let attr = VertexAttribute {
                    location,
                    components,
                    offset_bytes: offset,
                };
                offset = offset.saturating_add(components.saturating_mul(F32_SIZE));
                attr
            })
            .collect();

        Self {
            attributes,
            stride_bytes: offset,
        }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn stride_bytes(&self) -> i32 {
        self.stride_bytes
    }

    /// Floats per vertex.
    pub fn stride_floats(&self) -> usize {
        (self.stride_bytes / F32_SIZE) as usize
    }

    /// Checks that every attribute fits inside the stride and none overlap.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.attributes.is_empty() {
            return Err(GeometryError::EmptyLayout);
        }

        for (i, a) in self.attributes.iter().enumerate() {
            if !(1..=4).contains(&a.components) {
                return Err(GeometryError::BadComponents {
                    location: a.location,
                    components: a.components,
                });
            }
            if a.offset_bytes < 0 || a.end_bytes() > i64::from(self.stride_bytes) {
                return Err(GeometryError::AttributePastStride {
                    location: a.location,
                    end_bytes: a.end_bytes(),
                    stride_bytes: self.stride_bytes,
                });
            }

            for b in &self.attributes[..i] {
                if b.location == a.location {
                    return Err(GeometryError::DuplicateLocation(a.location));
                }
                if i64::from(a.offset_bytes) < b.end_bytes() && i64::from(b.offset_bytes) < a.end_bytes() {
                    return Err(GeometryError::OverlappingAttributes(b.location, a.location));
                }
            }
        }

        if self.stride_bytes % F32_SIZE != 0 {
            return Err(GeometryError::UnalignedStride(self.stride_bytes));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("vertex layout has no attributes")]
    EmptyLayout,

    #[error("attribute at location {location} has {components} components (expected 1..=4)")]
    BadComponents { location: u32, components: i32 },

    #[error("attribute at location {location} reads up to byte {end_bytes}, past stride {stride_bytes}")]
    AttributePastStride {
        location: u32,
        end_bytes: i64,
        stride_bytes: i32,
    },

    #[error("stride of {0} bytes is not a whole number of floats")]
    UnalignedStride(i32),

    #[error("attributes at locations {0} and {1} overlap")]
    OverlappingAttributes(u32, u32),

    #[error("location {0} declared twice")]
    DuplicateLocation(u32),

    #[error("{floats} floats is not a whole number of {stride}-float vertices")]
    RaggedVertexData { floats: usize, stride: usize },

    #[error("vertex data is empty")]
    EmptyVertexData,

    #[error("index list is empty")]
    EmptyIndices,

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("failed to create {what}: {reason}")]
    Create { what: &'static str, reason: String },
}

/// Vertex array + vertex buffer (+ optional element buffer) describing one mesh.
///
/// Created once at load and drawn every frame. The vertex array captures the
/// attribute pointers and the element buffer binding, so `draw` only has to
/// rebind it.
pub struct GeometryBuffer<G: GlBackend> {
    vertex_array: G::VertexArray,
    vertex_buffer: G::Buffer,
    element_buffer: Option<G::Buffer>,
    vertex_count: i32,
    index_count: Option<i32>,
    layout: VertexLayout,
}

impl<G: GlBackend> GeometryBuffer<G> {
    /// Uploads `vertices` (and `indices`, if any) and records the layout.
    ///
    /// Order: bind vertex array → fill vertex buffer → fill element buffer →
    /// describe + enable attributes → unbind vertex array. The element buffer
    /// must be bound while the vertex array is bound, or the vertex array will
    /// not remember it.
    pub fn init(
        gl: &G,
        vertices: &[f32],
        indices: Option<&[u32]>,
        layout: VertexLayout,
    ) -> Result<Self, GeometryError> {
        layout.validate()?;

        if vertices.is_empty() {
            return Err(GeometryError::EmptyVertexData);
        }
        let stride = layout.stride_floats();
        if vertices.len() % stride != 0 {
            return Err(GeometryError::RaggedVertexData {
                floats: vertices.len(),
                stride,
            });
        }
        let vertex_count = vertices.len() / stride;

        if indices.is_some_and(<[u32]>::is_empty) {
            return Err(GeometryError::EmptyIndices);
        }

        if let Some(&index) = indices.and_then(|ix| ix.iter().find(|&&i| i as usize >= vertex_count)) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        let vertex_array = gl
            .create_vertex_array()
            .map_err(|reason| GeometryError::Create {
                what: "vertex array",
                reason,
            })?;
        let vertex_buffer = match gl.create_buffer() {
            Ok(b) => b,
            Err(reason) => {
                gl.delete_vertex_array(vertex_array);
                return Err(GeometryError::Create {
                    what: "vertex buffer",
                    reason,
                });
            }
        };
        let element_buffer = match indices.map(|_| gl.create_buffer()).transpose() {
            Ok(b) => b,
            Err(reason) => {
                gl.delete_buffer(vertex_buffer);
                gl.delete_vertex_array(vertex_array);
                return Err(GeometryError::Create {
                    what: "element buffer",
                    reason,
                });
            }
        };

        gl.bind_vertex_array(Some(vertex_array));

        gl.bind_buffer(BufferTarget::Array, Some(vertex_buffer));
        gl.buffer_data(
            BufferTarget::Array,
            bytemuck::cast_slice(vertices),
            BufferUsage::StaticDraw,
        );

        if let (Some(ebo), Some(indices)) = (element_buffer, indices) {
            gl.bind_buffer(BufferTarget::ElementArray, Some(ebo));
            gl.buffer_data(
                BufferTarget::ElementArray,
                bytemuck::cast_slice(indices),
                BufferUsage::StaticDraw,
            );
        }

        for attr in layout.attributes() {
            gl.vertex_attrib_pointer_f32(
                attr.location,
                attr.components,
                false,
                layout.stride_bytes(),
                attr.offset_bytes,
            );
            gl.enable_vertex_attrib_array(attr.location);
        }

        gl.bind_vertex_array(None);

        log::debug!(
            "uploaded geometry: {vertex_count} vertices, {} indices, stride {} bytes",
            indices.map_or(0, <[u32]>::len),
            layout.stride_bytes()
        );

        Ok(Self {
            vertex_array,
            vertex_buffer,
            element_buffer,
            vertex_count: vertex_count as i32,
            index_count: indices.map(|ix| ix.len() as i32),
            layout,
        })
    }

    /// Binds the vertex array and issues one draw covering the whole mesh.
    ///
    /// A shader program must already be in use.
    pub fn draw(&self, gl: &G, primitive: Primitive) {
        gl.bind_vertex_array(Some(self.vertex_array));
        match self.index_count {
            Some(count) => gl.draw_elements_u32(primitive, count, 0),
            None => gl.draw_arrays(primitive, 0, self.vertex_count),
        }
    }

    /// Unbinds, then deletes every handle.
    ///
    /// Bindings are cleared first so no live binding points at a deleted object.
    pub fn destroy(self, gl: &G) {
        if self.element_buffer.is_some() {
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.bind_buffer(BufferTarget::ElementArray, None);
        }
        gl.bind_vertex_array(None);
        gl.bind_buffer(BufferTarget::Array, None);

        gl.delete_buffer(self.vertex_buffer);
        if let Some(ebo) = self.element_buffer {
            gl.delete_buffer(ebo);
        }
        gl.delete_vertex_array(self.vertex_array);

        log::debug!("destroyed geometry {:?}", self.vertex_array);
    }

    pub fn vertex_array(&self) -> G::VertexArray {
        self.vertex_array
    }

    pub fn vertex_buffer(&self) -> G::Buffer {
        self.vertex_buffer
    }

    pub fn element_buffer(&self) -> Option<G::Buffer> {
        self.element_buffer
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> Option<i32> {
        self.index_count
    }

    /// Vertices a single `draw` processes.
    pub fn draw_count(&self) -> i32 {
        self.index_count.unwrap_or(self.vertex_count)
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}

impl<G: GlBackend> fmt::Debug for GeometryBuffer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryBuffer")
            .field("vertex_array", &self.vertex_array)
            .field("vertex_buffer", &self.vertex_buffer)
            .field("element_buffer", &self.element_buffer)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .finish()
    }
}
