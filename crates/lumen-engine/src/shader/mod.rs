//! Shader programs.
//!
//! [`Program`] owns one linked vertex/fragment program on a
//! [`GraphicsContext`](crate::context::GraphicsContext). It compiles both
//! stages, links them, exposes activation plus typed uniform setters, and
//! releases the program when dropped.
//!
//! Shaders are WGSL. Compilation and linking are done with naga so that every
//! context implementation (GPU-backed or recording) agrees on what a valid
//! program is and which uniforms it exposes.

mod error;
mod program;
mod reflect;
mod source;
mod uniform;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::ShaderError;
pub use program::Program;
pub use reflect::{
    compile, link, CompiledStage, IoType, LinkedLayout, Stage, UniformKind, UniformSlot,
    MAX_BIND_GROUPS,
};
pub use source::load_source;
pub use uniform::UniformValue;
