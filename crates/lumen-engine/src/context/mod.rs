//! Graphics context handle.
//!
//! The "currently active program" is context state, not a process global.
//! Everything that touches it goes through a [`GraphicsContext`] value the
//! caller owns, so the same shader wrapper runs on the GPU-backed
//! [`GlContext`](crate::gl::GlContext) or on the CPU-only
//! [`RecordingContext`].
//!
//! Contexts are single-threaded: methods take `&self` and implementations use
//! interior mutability, the same way a GL context is one shared state machine.

mod error;
pub(crate) mod ids;
mod recording;
pub(crate) mod state;

pub use error::ContextError;
pub use ids::{ProgramId, StageId, TextureId, UniformLocation, VertexArrayId};
pub use recording::{Call, RecordingContext};

use crate::shader::{Stage, UniformValue};

/// Program-related operations of a graphics context.
pub trait GraphicsContext {
    /// Compiles one stage. The error string is the compiler log.
    fn compile_stage(&self, stage: Stage, source: &str) -> Result<StageId, String>;

    /// Links two compiled stages into a program. The error string is the
    /// link log. The stages stay alive until deleted.
    fn link_program(&self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String>;

    /// Releases a stage object. Unknown IDs are ignored.
    fn delete_stage(&self, stage: StageId);

    /// Releases a program. Unknown IDs are ignored. Deleting the active
    /// program leaves no program active.
    fn delete_program(&self, program: ProgramId);

    /// Makes `program` the target of subsequent uniform writes and draws.
    fn use_program(&self, program: ProgramId) -> Result<(), ContextError>;

    fn active_program(&self) -> Option<ProgramId>;

    /// Resolves an active uniform by name.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Writes `value` into `location` of the **active** program.
    fn set_uniform(&self, location: UniformLocation, value: UniformValue)
        -> Result<(), ContextError>;

    /// Reads the current value of a uniform. Samplers have no value.
    fn uniform_value(&self, program: ProgramId, location: UniformLocation)
        -> Option<UniformValue>;
}
