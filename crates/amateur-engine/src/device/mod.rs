//! OpenGL device layer.
//!
//! This module is responsible for:
//! - the `GlBackend` contract every GPU resource is created through
//! - the `glow` implementation used at runtime
//! - creating the window surface + GL context (glutin)
//! - tracking live GPU handles for leak reports

mod context;
mod gl;
mod glow_backend;
mod init;
mod ledger;

#[cfg(test)]
pub(crate) mod recording;

pub use context::GlContext;
pub use gl::{BufferTarget, BufferUsage, DebugCallback, GlBackend, Primitive, ShaderStage};
pub use glow_backend::GlowBackend;
pub use init::GlInit;
pub use ledger::{HandleKind, HandleLedger};
