use std::fmt;

use crate::device::{GlBackend, ShaderStage};

/// Compile diagnostics of one failed stage.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StageFailure {
    pub stage: ShaderStage,
    /// Raw driver info log.
    pub log: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to create {what}: {reason}")]
    Create { what: &'static str, reason: String },

    #[error("shader compilation failed: {}", stage_list(.failures))]
    Compile { failures: Vec<StageFailure> },

    #[error("program link failed: {log}")]
    Link { log: String },

    #[error("shader program {0} used after dispose")]
    Disposed(String),
}

impl ShaderError {
    /// Failure of `stage`, if this is a compile error that includes it.
    pub fn stage_failure(&self, stage: ShaderStage) -> Option<&StageFailure> {
        match self {
            ShaderError::Compile { failures } => failures.iter().find(|f| f.stage == stage),
            _ => None,
        }
    }
}

fn stage_list(failures: &[StageFailure]) -> String {
    failures
        .iter()
        .map(|f| f.stage.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A linked vertex + fragment program.
///
/// Owns exactly one program handle. `dispose` releases it; dropping a program
/// that was never disposed logs a leak warning (the driver still reclaims the
/// handle when the context goes away).
pub struct ShaderProgram<G: GlBackend> {
    handle: G::Program,
    disposed: bool,
}

/// A compiled (or failed) stage object; deleted before `compile` returns.
struct CompiledStage<G: GlBackend> {
    stage: ShaderStage,
    handle: G::Shader,
    ok: bool,
    log: String,
}

impl<G: GlBackend> ShaderProgram<G> {
    /// Compiles both stages, then links them.
    ///
    /// Stages are compiled independently and both are checked before anything
    /// else happens: if either fails, linking is skipped and every failing
    /// stage is reported with its info log. No stage object outlives this call.
    pub fn compile(gl: &G, vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        let vertex = compile_stage(gl, ShaderStage::Vertex, vertex_src)?;
        let fragment = match compile_stage(gl, ShaderStage::Fragment, fragment_src) {
            Ok(stage) => stage,
            Err(e) => {
                gl.delete_shader(vertex.handle);
                return Err(e);
            }
        };

        let failures: Vec<StageFailure> = [&vertex, &fragment]
            .into_iter()
            .filter(|s| !s.ok)
            .map(|s| StageFailure {
                stage: s.stage,
                log: s.log.clone(),
            })
            .collect();

        if !failures.is_empty() {
            for f in &failures {
                log::error!("{} shader failed to compile:\n{}", f.stage, f.log.trim_end());
            }
            log::warn!("skipping link: {} stage(s) failed", failures.len());
            gl.delete_shader(vertex.handle);
            gl.delete_shader(fragment.handle);
            return Err(ShaderError::Compile { failures });
        }

        let linked = link(gl, &vertex, &fragment);

        gl.delete_shader(vertex.handle);
        gl.delete_shader(fragment.handle);

        let handle = linked?;
        log::debug!("linked shader program {handle:?}");

        Ok(Self {
            handle,
            disposed: false,
        })
    }

    /// Makes this program current (`glUseProgram`).
    ///
    /// Must precede uniform updates and draws that depend on it.
    pub fn bind(&self, gl: &G) -> Result<(), ShaderError> {
        if self.disposed {
            log::error!("attempted to use disposed shader program {:?}", self.handle);
            return Err(ShaderError::Disposed(format!("{:?}", self.handle)));
        }
        gl.use_program(Some(self.handle));
        Ok(())
    }

    /// Looks up the location of a vertex input by name.
    ///
    /// Lets a `VertexLayout` follow the shader instead of assuming fixed
    /// `layout (location = N)` qualifiers. `None` if the input is not active.
    pub fn attrib_location(&self, gl: &G, name: &str) -> Option<u32> {
        let location = gl.attrib_location(self.handle, name);
        if location.is_none() {
            log::warn!("vertex input `{name}` not found in program {:?}", self.handle);
        }
        location
    }

    /// Looks up a uniform by name.
    ///
    /// `None` is not fatal: the uniform may have been optimized out or renamed.
    /// Callers skip the value update in that case.
    pub fn uniform_location(&self, gl: &G, name: &str) -> Option<G::UniformLocation> {
        let location = gl.uniform_location(self.handle, name);
        if location.is_none() {
            log::warn!(
                "uniform `{name}` not found in program {:?}; updates will be skipped",
                self.handle
            );
        }
        location
    }

    /// Sets a float uniform. The program must be bound.
    pub fn set_uniform_f32(&self, gl: &G, location: &G::UniformLocation, value: f32) {
        gl.uniform_1_f32(location, value);
    }

    /// Deletes the program handle.
    ///
    /// Idempotent; returns `true` only for the call that deleted the handle.
    pub fn dispose(&mut self, gl: &G) -> bool {
        if self.disposed {
            return false;
        }
        gl.delete_program(self.handle);
        self.disposed = true;
        log::debug!("disposed shader program {:?}", self.handle);
        true
    }

    pub fn handle(&self) -> G::Program {
        self.handle
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<G: GlBackend> fmt::Debug for ShaderProgram<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<G: GlBackend> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        if !self.disposed {
            log::warn!(
                "GPU resource leak: shader program {:?} dropped without dispose()",
                self.handle
            );
        }
    }
}

fn compile_stage<G: GlBackend>(
    gl: &G,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledStage<G>, ShaderError> {
    let handle = gl.create_shader(stage).map_err(|reason| ShaderError::Create {
        what: match stage {
            ShaderStage::Vertex => "vertex shader object",
            ShaderStage::Fragment => "fragment shader object",
        },
        reason,
    })?;

    gl.shader_source(handle, source);
    gl.compile_shader(handle);

    let ok = gl.shader_compile_status(handle);
    let log = gl.shader_info_log(handle);
    if ok && !log.trim().is_empty() {
        log::info!("{stage} shader compiled with messages:\n{}", log.trim_end());
    }

    Ok(CompiledStage {
        stage,
        handle,
        ok,
        log,
    })
}

/// Attach → link → check → detach. The program is deleted if linking fails.
fn link<G: GlBackend>(
    gl: &G,
    vertex: &CompiledStage<G>,
    fragment: &CompiledStage<G>,
) -> Result<G::Program, ShaderError> {
    let program = gl.create_program().map_err(|reason| ShaderError::Create {
        what: "program object",
        reason,
    })?;

    gl.attach_shader(program, vertex.handle);
    gl.attach_shader(program, fragment.handle);
    gl.link_program(program);

    let linked = gl.program_link_status(program);

    gl.detach_shader(program, vertex.handle);
    gl.detach_shader(program, fragment.handle);

    if !linked {
        let log = gl.program_info_log(program);
        log::error!("shader program failed to link:\n{}", log.trim_end());
        gl.delete_program(program);
        return Err(ShaderError::Link { log });
    }

    Ok(program)
}
