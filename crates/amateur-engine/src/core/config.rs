use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diagnostics::DebugPolicy;
use crate::paint::Color;
use crate::render::{Shape, COLORED_FRAG, COLORED_VERT};

/// Where the vertex and fragment shader sources come from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ShaderSource {
    Inline { vertex: String, fragment: String },
    Files { vertex: PathBuf, fragment: PathBuf },
}

impl ShaderSource {
    pub fn inline(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::Inline {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// `shader.vert` and `shader.frag` inside `dir`.
    pub fn files(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::Files {
            vertex: dir.join("shader.vert"),
            fragment: dir.join("shader.frag"),
        }
    }

    /// Returns `(vertex, fragment)` source text.
    pub fn read(&self) -> Result<(String, String)> {
        match self {
            Self::Inline { vertex, fragment } => Ok((vertex.clone(), fragment.clone())),
            Self::Files { vertex, fragment } => {
                let vs = std::fs::read_to_string(vertex)
                    .with_context(|| format!("failed to read vertex shader {}", vertex.display()))?;
                let fs = std::fs::read_to_string(fragment).with_context(|| {
                    format!("failed to read fragment shader {}", fragment.display())
                })?;
                Ok((vs, fs))
            }
        }
    }
}

impl Default for ShaderSource {
    fn default() -> Self {
        Self::inline(COLORED_VERT, COLORED_FRAG)
    }
}

/// Render loop configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub shape: Shape,
    pub clear_color: Color,
    pub shaders: ShaderSource,

    /// Float uniform receiving the pulse value each frame; `None` disables it.
    pub pulse_uniform: Option<String>,

    /// Frame indices `[start, end)` narrated step by step when `verbose` is set.
    pub debug_window: Range<u64>,
    pub verbose: bool,

    pub debug: DebugPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shape: Shape::Triangle,
            clear_color: Color::rgba(0.2, 0.3, 0.3, 1.0),
            shaders: ShaderSource::default(),
            pulse_uniform: Some("uPulse".to_string()),
            debug_window: 0..3,
            verbose: false,
            debug: DebugPolicy::default(),
        }
    }
}
