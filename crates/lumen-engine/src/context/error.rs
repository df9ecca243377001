use crate::shader::{IoType, UniformKind};

use super::{ProgramId, TextureId, UniformLocation, VertexArrayId};

/// Errors a context reports for invalid operations.
///
/// These are the cases where GL would raise `GL_INVALID_OPERATION` or
/// `GL_INVALID_VALUE`; here the caller gets them back directly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("program {0} is not a valid program object")]
    InvalidProgram(ProgramId),

    #[error("no program is active")]
    NoActiveProgram,

    #[error("uniform location {location} is out of range for program {program}")]
    InvalidLocation {
        program: ProgramId,
        location: UniformLocation,
    },

    #[error("uniform `{name}` is {expected:?}; a {found} value cannot be assigned to it")]
    TypeMismatch {
        name: String,
        expected: UniformKind,
        found: &'static str,
    },

    #[error("no render target; call begin_frame first")]
    NoRenderTarget,

    #[error("no vertex array is bound")]
    NoVertexArray,

    #[error("vertex array {0} is not valid")]
    InvalidVertexArray(VertexArrayId),

    #[error("the bound vertex array has no attribute at location {location}")]
    MissingVertexAttribute { location: u32 },

    #[error("draw of vertices {first}..{end} exceeds the {available} vertices in the bound vertex array")]
    DrawOutOfRange { first: u32, end: u32, available: u32 },

    #[error("texture {0} is not valid")]
    InvalidTexture(TextureId),

    #[error("the context has run out of object handles")]
    HandlesExhausted,

    #[error("the bound vertex array feeds location {location} with {format:?}, but the vertex stage reads {expected}")]
    VertexAttributeType {
        location: u32,
        format: wgpu::VertexFormat,
        expected: IoType,
    },

    #[error("failed to create a render pipeline:\n{log}")]
    Pipeline { log: String },
}
