use std::fmt;

use crate::diagnostics::DebugMessage;
use crate::paint::Color;

/// Programmable pipeline stage a shader object is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
        })
    }
}

/// Buffer binding point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data (`GL_ARRAY_BUFFER`).
    Array,
    /// Index data (`GL_ELEMENT_ARRAY_BUFFER`). The binding is stored in the
    /// currently bound vertex array, not globally.
    ElementArray,
}

/// Upload usage hint.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Written once, read many times by the GPU.
    StaticDraw,
    /// Rewritten often, read many times.
    DynamicDraw,
    /// Rewritten before every draw.
    StreamDraw,
}

/// Primitive assembly mode for draw calls.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Triangles,
}

/// Closure invoked for every backend debug message.
///
/// Must be callable from any thread: drivers may deliver messages
/// asynchronously on an internal thread.
pub type DebugCallback = Box<dyn Fn(&DebugMessage) + Send + Sync + 'static>;

/// OpenGL-shaped backend contract.
///
/// The methods mirror the GL calls the engine issues, including the hidden
/// global binding state: `bind_vertex_array` and `bind_buffer` change what
/// later calls operate on. Callers own the ordering; the required order is
/// documented where it matters (`GeometryBuffer::init`, `ShaderProgram::compile`).
///
/// All methods must be called on the thread that owns the context.
pub trait GlBackend {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type Buffer: Copy + fmt::Debug;
    type VertexArray: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    // ── shaders ───────────────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    // ── programs ──────────────────────────────────────────────────────────

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    /// Location of a vertex input. `None` when it is not an active attribute.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// `None` is the "not found" sentinel (`-1` in raw GL).
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;

    /// Sets a float uniform on the program currently in use.
    fn uniform_1_f32(&self, location: &Self::UniformLocation, value: f32);

    // ── vertex arrays + buffers ───────────────────────────────────────────

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Describes a float attribute read from the buffer currently bound to
    /// `BufferTarget::Array`. The buffer is captured at call time.
    fn vertex_attrib_pointer_f32(
        &self,
        location: u32,
        components: i32,
        normalized: bool,
        stride_bytes: i32,
        offset_bytes: i32,
    );
    fn enable_vertex_attrib_array(&self, location: u32);

    // ── drawing ───────────────────────────────────────────────────────────

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32);

    /// Indexed draw over `u32` indices from the element buffer of the bound vertex array.
    fn draw_elements_u32(&self, primitive: Primitive, count: i32, offset_bytes: i32);

    fn clear_color(&self, color: Color);
    fn clear_color_buffer(&self);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    // ── debug output ──────────────────────────────────────────────────────

    fn supports_debug(&self) -> bool;

    /// Hands `callback` to the context, which keeps it alive for its own lifetime.
    fn set_debug_callback(&mut self, callback: DebugCallback);
    fn enable_debug_output(&self, synchronous: bool);
}
