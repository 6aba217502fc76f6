//! In-memory `GlBackend` used by unit tests.
//!
//! Records every call in order, hands out increasing non-zero handles, and
//! models the binding state the real API keeps (current program, bound vertex
//! array, bound array buffer, per-vertex-array element buffer and attribute
//! snapshots). Misuse of that state is reported the way a GL debug context
//! reports it: as an error-class debug message.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::diagnostics::{DebugKind, DebugMessage, DebugSeverity, DebugSource};
use crate::paint::Color;

use super::gl::{BufferTarget, BufferUsage, DebugCallback, GlBackend, Primitive, ShaderStage};

const GL_INVALID_OPERATION: u32 = 0x0502;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(ShaderStage, u32),
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    AttribLocation(String),
    UniformLocation(String),
    Uniform1f(u32, f32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer(u32),
    BindBuffer(BufferTarget, Option<u32>),
    BufferData {
        target: BufferTarget,
        len: usize,
        usage: BufferUsage,
    },
    DeleteBuffer(u32),
    AttribPointer {
        location: u32,
        components: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    EnableAttrib(u32),
    DrawArrays {
        primitive: Primitive,
        first: i32,
        count: i32,
    },
    DrawElements {
        primitive: Primitive,
        count: i32,
        offset: i32,
    },
    ClearColor(Color),
    Clear,
    Viewport(i32, i32, i32, i32),
    SetDebugCallback,
    EnableDebugOutput {
        synchronous: bool,
    },
}

impl Call {
    pub(crate) fn is_draw(&self) -> bool {
        matches!(self, Call::DrawArrays { .. } | Call::DrawElements { .. })
    }
}

/// Attribute configuration as captured by a vertex array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AttribState {
    pub buffer: u32,
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct VertexArrayState {
    element_buffer: Option<u32>,
    attribs: HashMap<u32, AttribState>,
}

#[derive(Debug)]
struct ShaderState {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
    deleted: bool,
}

#[derive(Debug, Default)]
struct ProgramState {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    attributes: Vec<(String, u32)>,
    deleted: bool,
}

pub(crate) struct RecordingGl {
    pub debug_supported: bool,

    /// Info log reported by the next link, which then fails.
    pub link_failure: Option<String>,

    calls: RefCell<Vec<Call>>,
    next_id: Cell<u32>,
    shaders: RefCell<HashMap<u32, ShaderState>>,
    programs: RefCell<HashMap<u32, ProgramState>>,
    vertex_arrays: RefCell<HashMap<u32, VertexArrayState>>,
    buffers: RefCell<HashMap<u32, usize>>,
    bound_vertex_array: Cell<Option<u32>>,
    bound_array_buffer: Cell<Option<u32>>,
    current_program: Cell<Option<u32>>,
    callback: Option<DebugCallback>,
    errors: RefCell<Vec<DebugMessage>>,
}

impl RecordingGl {
    pub(crate) fn new() -> Self {
        Self {
            debug_supported: true,
            link_failure: None,
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            shaders: RefCell::new(HashMap::new()),
            programs: RefCell::new(HashMap::new()),
            vertex_arrays: RefCell::new(HashMap::new()),
            buffers: RefCell::new(HashMap::new()),
            bound_vertex_array: Cell::new(None),
            bound_array_buffer: Cell::new(None),
            current_program: Cell::new(None),
            callback: None,
            errors: RefCell::new(Vec::new()),
        }
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn draws(&self) -> Vec<Call> {
        self.calls.borrow().iter().filter(|c| c.is_draw()).cloned().collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Error-class messages produced so far, whether or not a callback was installed.
    pub(crate) fn errors(&self) -> Vec<DebugMessage> {
        self.errors.borrow().clone()
    }

    pub(crate) fn attrib(&self, vertex_array: u32, location: u32) -> Option<AttribState> {
        self.vertex_arrays
            .borrow()
            .get(&vertex_array)
            .and_then(|v| v.attribs.get(&location).cloned())
    }

    pub(crate) fn element_buffer(&self, vertex_array: u32) -> Option<u32> {
        self.vertex_arrays
            .borrow()
            .get(&vertex_array)
            .and_then(|v| v.element_buffer)
    }

    pub(crate) fn buffer_len(&self, buffer: u32) -> Option<usize> {
        self.buffers.borrow().get(&buffer).copied()
    }

    pub(crate) fn live_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub(crate) fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.borrow().len()
    }

    pub(crate) fn live_shaders(&self) -> usize {
        self.shaders.borrow().values().filter(|s| !s.deleted).count()
    }

    pub(crate) fn bound_vertex_array(&self) -> Option<u32> {
        self.bound_vertex_array.get()
    }

    pub(crate) fn current_program(&self) -> Option<u32> {
        self.current_program.get()
    }

    // ── driver simulation ─────────────────────────────────────────────────

    /// Delivers a message as the driver would.
    pub(crate) fn emit(&self, msg: DebugMessage) {
        if msg.is_error() {
            self.errors.borrow_mut().push(msg.clone());
        }
        if let Some(callback) = &self.callback {
            callback(&msg);
        }
    }

    pub(crate) fn take_callback(&mut self) -> Option<DebugCallback> {
        self.callback.take()
    }

    fn invalid(&self, text: impl Into<String>) {
        self.emit(DebugMessage {
            source: DebugSource::Api,
            kind: DebugKind::Error,
            id: GL_INVALID_OPERATION,
            severity: DebugSeverity::High,
            text: text.into(),
        });
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn next_handle(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<u32> {
        match target {
            BufferTarget::Array => self.bound_array_buffer.get(),
            BufferTarget::ElementArray => self
                .bound_vertex_array
                .get()
                .and_then(|v| self.element_buffer(v)),
        }
    }

    fn check_draw_state(&self, indexed: bool) -> bool {
        let program_ok = self.current_program.get().is_some_and(|p| {
            self.programs
                .borrow()
                .get(&p)
                .is_some_and(|s| s.linked && !s.deleted)
        });
        if !program_ok {
            self.invalid("draw issued without a linked program in use");
            return false;
        }

        let Some(vao) = self.bound_vertex_array.get() else {
            self.invalid("draw issued with no vertex array bound");
            return false;
        };

        let arrays = self.vertex_arrays.borrow();
        let Some(state) = arrays.get(&vao) else {
            self.invalid("draw issued with a deleted vertex array bound");
            return false;
        };

        let buffers = self.buffers.borrow();
        let attribs_ok = state
            .attribs
            .values()
            .filter(|a| a.enabled)
            .all(|a| buffers.contains_key(&a.buffer));
        if !attribs_ok {
            self.invalid("enabled attribute reads from a deleted buffer");
            return false;
        }

        if indexed && !state.element_buffer.is_some_and(|b| buffers.contains_key(&b)) {
            self.invalid("indexed draw with no element buffer in the bound vertex array");
            return false;
        }

        true
    }
}

fn compile_log(source: &str) -> Option<String> {
    if !source.contains("void main") {
        return Some("0:1(1): error: no function with name 'main'".to_string());
    }
    if source.matches('{').count() != source.matches('}').count() {
        let line = source.lines().count();
        return Some(format!("0:{line}(1): error: syntax error, unexpected end of file"));
    }
    None
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("uniform "))
        .filter_map(|l| l.trim_end_matches(';').split_whitespace().last())
        .map(str::to_string)
}

/// Vertex inputs with their locations. Inputs without an explicit
/// `layout (location = N)` take the lowest free location, in declaration order.
fn declared_inputs(source: &str) -> Vec<(String, u32)> {
    let declared: Vec<(String, Option<u32>)> = source
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let (qualifier, decl) = match line.split_once(" in ") {
                Some((layout, decl)) if layout.starts_with("layout") => (Some(layout), decl),
                _ => (None, line.strip_prefix("in ")?),
            };
            let name = decl.trim_end_matches(';').split_whitespace().last()?;
            let location = qualifier.and_then(|q| {
                let (_, n) = q.split_once('=')?;
                n.trim_end_matches(|c: char| c == ')' || c.is_whitespace())
                    .trim()
                    .parse()
                    .ok()
            });
            Some((name.to_string(), location))
        })
        .collect();

    let mut taken: Vec<u32> = declared.iter().filter_map(|(_, l)| *l).collect();
    declared
        .into_iter()
        .map(|(name, location)| {
            let location = location.unwrap_or_else(|| {
                let free = (0..).find(|l| !taken.contains(l)).unwrap_or_default();
                taken.push(free);
                free
            });
            (name, location)
        })
        .collect()
}

impl GlBackend for RecordingGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let id = self.next_handle();
        self.record(Call::CreateShader(stage, id));
        self.shaders.borrow_mut().insert(
            id,
            ShaderState {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
                deleted: false,
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.record(Call::ShaderSource(shader));
        if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
        if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
            match compile_log(&s.source) {
                Some(log) => {
                    s.compiled = false;
                    s.log = log;
                }
                None => {
                    s.compiled = true;
                    s.log.clear();
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.shaders.borrow().get(&shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.shaders
            .borrow()
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
        if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
            s.deleted = true;
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.next_handle();
        self.record(Call::CreateProgram(id));
        self.programs.borrow_mut().insert(id, ProgramState::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
        let shaders = self.shaders.borrow();
        let mut programs = self.programs.borrow_mut();
        let Some(p) = programs.get_mut(&program) else { return };

        let all_compiled = p
            .attached
            .iter()
            .all(|s| shaders.get(s).is_some_and(|s| s.compiled));

        if let Some(log) = &self.link_failure {
            p.linked = false;
            p.log = log.clone();
        } else if !all_compiled || p.attached.is_empty() {
            p.linked = false;
            p.log = "error: linking with uncompiled/unspecialized shader".to_string();
        } else {
            p.linked = true;
            p.log.clear();
            p.uniforms = p
                .attached
                .iter()
                .filter_map(|s| shaders.get(s))
                .flat_map(|s| declared_uniforms(&s.source).collect::<Vec<_>>())
                .collect();
            p.attributes = p
                .attached
                .iter()
                .filter_map(|s| shaders.get(s))
                .find(|s| s.stage == ShaderStage::Vertex)
                .map(|s| declared_inputs(&s.source))
                .unwrap_or_default();
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.programs.borrow().get(&program).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.programs
            .borrow()
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
        if let Some(p) = program {
            let usable = self
                .programs
                .borrow()
                .get(&p)
                .is_some_and(|s| s.linked && !s.deleted);
            if !usable {
                self.invalid(format!("program {p} is not a linked program object"));
                return;
            }
        }
        self.current_program.set(program);
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.deleted = true;
        }
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        self.record(Call::AttribLocation(name.to_string()));
        let programs = self.programs.borrow();
        let p = programs.get(&program).filter(|p| p.linked)?;
        p.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, location)| *location)
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.record(Call::UniformLocation(name.to_string()));
        let programs = self.programs.borrow();
        let p = programs.get(&program).filter(|p| p.linked)?;
        p.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as u32)
    }

    fn uniform_1_f32(&self, location: &u32, value: f32) {
        self.record(Call::Uniform1f(*location, value));
        if self.current_program.get().is_none() {
            self.invalid("uniform set with no program in use");
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let id = self.next_handle();
        self.record(Call::CreateVertexArray(id));
        self.vertex_arrays
            .borrow_mut()
            .insert(id, VertexArrayState::default());
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
        if let Some(v) = vertex_array {
            if !self.vertex_arrays.borrow().contains_key(&v) {
                self.invalid(format!("vertex array {v} does not exist"));
                return;
            }
        }
        self.bound_vertex_array.set(vertex_array);
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.record(Call::DeleteVertexArray(vertex_array));
        self.vertex_arrays.borrow_mut().remove(&vertex_array);
        if self.bound_vertex_array.get() == Some(vertex_array) {
            self.bound_vertex_array.set(None);
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let id = self.next_handle();
        self.record(Call::CreateBuffer(id));
        self.buffers.borrow_mut().insert(id, 0);
        Ok(id)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<u32>) {
        self.record(Call::BindBuffer(target, buffer));
        match target {
            BufferTarget::Array => self.bound_array_buffer.set(buffer),
            BufferTarget::ElementArray => match self.bound_vertex_array.get() {
                Some(vao) => {
                    if let Some(state) = self.vertex_arrays.borrow_mut().get_mut(&vao) {
                        state.element_buffer = buffer;
                    }
                }
                None if buffer.is_some() => {
                    self.invalid("element buffer bound with no vertex array to hold it");
                }
                None => {}
            },
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(Call::BufferData {
            target,
            len: data.len(),
            usage,
        });
        match self.bound_buffer(target) {
            Some(b) => {
                self.buffers.borrow_mut().insert(b, data.len());
            }
            None => self.invalid(format!("no buffer bound to {target:?}")),
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
        self.buffers.borrow_mut().remove(&buffer);
        if self.bound_array_buffer.get() == Some(buffer) {
            self.bound_array_buffer.set(None);
        }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        location: u32,
        components: i32,
        normalized: bool,
        stride_bytes: i32,
        offset_bytes: i32,
    ) {
        self.record(Call::AttribPointer {
            location,
            components,
            normalized,
            stride: stride_bytes,
            offset: offset_bytes,
        });

        let Some(vao) = self.bound_vertex_array.get() else {
            self.invalid("attribute pointer configured with no vertex array bound");
            return;
        };
        let Some(buffer) = self.bound_array_buffer.get() else {
            self.invalid("attribute pointer configured with no array buffer bound");
            return;
        };

        let mut arrays = self.vertex_arrays.borrow_mut();
        if let Some(state) = arrays.get_mut(&vao) {
            let entry = state.attribs.entry(location).or_default();
            entry.buffer = buffer;
            entry.components = components;
            entry.stride = stride_bytes;
            entry.offset = offset_bytes;
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.record(Call::EnableAttrib(location));
        let Some(vao) = self.bound_vertex_array.get() else {
            self.invalid("attribute enabled with no vertex array bound");
            return;
        };
        if let Some(state) = self.vertex_arrays.borrow_mut().get_mut(&vao) {
            state.attribs.entry(location).or_default().enabled = true;
        }
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        self.record(Call::DrawArrays {
            primitive,
            first,
            count,
        });
        self.check_draw_state(false);
    }

    fn draw_elements_u32(&self, primitive: Primitive, count: i32, offset_bytes: i32) {
        self.record(Call::DrawElements {
            primitive,
            count,
            offset: offset_bytes,
        });
        self.check_draw_state(true);
    }

    fn clear_color(&self, color: Color) {
        self.record(Call::ClearColor(color));
    }

    fn clear_color_buffer(&self) {
        self.record(Call::Clear);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn supports_debug(&self) -> bool {
        self.debug_supported
    }

    fn set_debug_callback(&mut self, callback: DebugCallback) {
        self.record(Call::SetDebugCallback);
        self.callback = Some(callback);
    }

    fn enable_debug_output(&self, synchronous: bool) {
        self.record(Call::EnableDebugOutput { synchronous });
    }
}
