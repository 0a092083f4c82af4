use std::fmt;

use thiserror::Error;

use crate::gl::ShaderStage;

/// Driver object kind, used to report allocation failures.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    Shader,
    Program,
    VertexArray,
    Buffer,
    Texture,
    Framebuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Shader => "shader object",
            ResourceKind::Program => "program object",
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Framebuffer => "framebuffer",
        };
        f.write_str(name)
    }
}

/// Setup-time failures.
///
/// None of these leave usable partial state behind; callers are expected to
/// treat them as fatal initialization errors. Per-frame operations never
/// return them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program `{id}` failed to link: {log}")]
    ProgramLink { id: String, log: String },

    #[error("failed to allocate {kind}: {reason}")]
    ResourceAllocation { kind: ResourceKind, reason: String },

    #[error(
        "attribute `{attribute}` of geometry `{geometry}` has no resolved layout; \
         create a program declaring it first"
    )]
    UnresolvedAttribute { geometry: String, attribute: String },

    #[error("geometry `{geometry}` has no instanced buffer for attribute `{attribute}`")]
    UnknownInstancedAttribute { geometry: String, attribute: String },

    #[error("no program registered under `{0}`")]
    UnknownProgram(String),

    #[error("no geometry registered under `{0}`")]
    UnknownGeometry(String),

    #[error("no render target registered under `{0}`")]
    UnknownRenderTarget(String),

    #[error("framebuffer for render target `{0}` is incomplete")]
    IncompleteFramebuffer(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Lifts a driver `create_*` result into [`Error::ResourceAllocation`].
pub(crate) fn allocated<T>(kind: ResourceKind, r: std::result::Result<T, String>) -> Result<T> {
    r.map_err(|reason| Error::ResourceAllocation { kind, reason })
}
