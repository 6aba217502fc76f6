use glow::HasContext;

use crate::diagnostics::{DebugKind, DebugMessage, DebugSeverity, DebugSource};
use crate::paint::Color;

use super::gl::{BufferTarget, BufferUsage, DebugCallback, GlBackend, Primitive, ShaderStage};

/// `GlBackend` over a `glow` context.
///
/// Every `glow` call is `unsafe` because it requires a current context on the
/// calling thread. That requirement is established once, by `GlowBackend::new`,
/// and upheld by the runtime which never moves the context off its thread.
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Wraps a loaded `glow` context.
    ///
    /// # Safety
    ///
    /// The GL context `gl` was loaded from must be current on the calling
    /// thread, and must stay current on this thread for as long as the
    /// returned backend (or anything created through it) is used.
    pub unsafe fn new(gl: glow::Context) -> Self {
        let version = gl.version();
        log::info!(
            "OpenGL {}.{}{} ({})",
            version.major,
            version.minor,
            if version.is_embedded { " ES" } else { "" },
            version.vendor_info
        );
        Self { gl }
    }
}

impl GlBackend for GlowBackend {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn uniform_1_f32(&self, location: &Self::UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(location), value) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
        };
        unsafe { self.gl.buffer_data_u8_slice(buffer_target(target), data, usage) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        location: u32,
        components: i32,
        normalized: bool,
        stride_bytes: i32,
        offset_bytes: i32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                components,
                glow::FLOAT,
                normalized,
                stride_bytes,
                offset_bytes,
            )
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive_mode(primitive), first, count) }
    }

    fn draw_elements_u32(&self, primitive: Primitive, count: i32, offset_bytes: i32) {
        unsafe {
            self.gl
                .draw_elements(primitive_mode(primitive), count, glow::UNSIGNED_INT, offset_bytes)
        }
    }

    fn clear_color(&self, color: Color) {
        unsafe { self.gl.clear_color(color.r, color.g, color.b, color.a) }
    }

    fn clear_color_buffer(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn supports_debug(&self) -> bool {
        self.gl.supports_debug()
    }

    fn set_debug_callback(&mut self, callback: DebugCallback) {
        unsafe {
            self.gl
                .debug_message_callback(move |source, kind, id, severity, text: &str| {
                    callback(&DebugMessage {
                        source: debug_source(source),
                        kind: debug_kind(kind),
                        id,
                        severity: debug_severity(severity),
                        text: text.to_string(),
                    });
                });
        }
    }

    fn enable_debug_output(&self, synchronous: bool) {
        unsafe {
            self.gl.enable(glow::DEBUG_OUTPUT);
            if synchronous {
                self.gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
            }
        }
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn primitive_mode(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Triangles => glow::TRIANGLES,
    }
}

fn debug_source(raw: u32) -> DebugSource {
    match raw {
        glow::DEBUG_SOURCE_API => DebugSource::Api,
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => DebugSource::WindowSystem,
        glow::DEBUG_SOURCE_SHADER_COMPILER => DebugSource::ShaderCompiler,
        glow::DEBUG_SOURCE_THIRD_PARTY => DebugSource::ThirdParty,
        glow::DEBUG_SOURCE_APPLICATION => DebugSource::Application,
        _ => DebugSource::Other,
    }
}

fn debug_kind(raw: u32) -> DebugKind {
    match raw {
        glow::DEBUG_TYPE_ERROR => DebugKind::Error,
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => DebugKind::DeprecatedBehavior,
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => DebugKind::UndefinedBehavior,
        glow::DEBUG_TYPE_PORTABILITY => DebugKind::Portability,
        glow::DEBUG_TYPE_PERFORMANCE => DebugKind::Performance,
        glow::DEBUG_TYPE_MARKER => DebugKind::Marker,
        glow::DEBUG_TYPE_PUSH_GROUP => DebugKind::PushGroup,
        glow::DEBUG_TYPE_POP_GROUP => DebugKind::PopGroup,
        _ => DebugKind::Other,
    }
}

fn debug_severity(raw: u32) -> DebugSeverity {
    match raw {
        glow::DEBUG_SEVERITY_HIGH => DebugSeverity::High,
        glow::DEBUG_SEVERITY_MEDIUM => DebugSeverity::Medium,
        glow::DEBUG_SEVERITY_LOW => DebugSeverity::Low,
        _ => DebugSeverity::Notification,
    }
}
