use std::path::PathBuf;

use crate::context::ContextError;

use super::Stage;

/// Errors produced while building or driving a [`Program`](super::Program).
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// A shader source file could not be read.
    #[error("failed to read shader source {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stage failed to compile; `log` holds the compiler diagnostic.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: Stage, log: String },

    /// The stages compiled but could not be linked together.
    #[error("program failed to link:\n{log}")]
    Link { log: String },

    /// The name does not match an active uniform of the program.
    ///
    /// Uniforms that are declared but never read by an entry point are not
    /// active, so they also end up here.
    #[error("uniform '{name}' not found")]
    UniformNotFound { name: String },

    /// The context rejected the operation.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl ShaderError {
    /// Returns true for the recoverable "unknown uniform" case.
    pub fn is_uniform_not_found(&self) -> bool {
        matches!(self, ShaderError::UniformNotFound { .. })
    }
}
