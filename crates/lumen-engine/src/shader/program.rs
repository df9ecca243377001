use std::path::Path;
use std::rc::Rc;

use crate::context::{GraphicsContext, ProgramId, StageId, UniformLocation};
use crate::gl::GlContext;

use super::{load_source, ShaderError, Stage, UniformValue};

/// A linked vertex + fragment program.
///
/// The wrapper exclusively owns its program handle: it is not `Clone`, it
/// can be moved, and dropping it deletes the program on its context exactly
/// once. A `Program` only exists after a successful link, so every method
/// operates on a valid handle.
///
/// Uniform writes go to whichever program is *active* on the context; call
/// [`activate`](Self::activate) first. This is not checked.
pub struct Program<C: GraphicsContext = GlContext> {
    ctx: Rc<C>,
    id: ProgramId,
}

impl<C: GraphicsContext> Program<C> {
    /// Reads, compiles and links the two stage files.
    pub fn from_files(
        ctx: &Rc<C>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();

        let vertex = load_source(vertex_path)?;
        let fragment = load_source(fragment_path)?;

        log::debug!(
            "building program from {} and {}",
            vertex_path.display(),
            fragment_path.display()
        );
        Self::from_sources(ctx, &vertex, &fragment)
    }

    /// Compiles and links in-memory stage sources.
    pub fn from_sources(ctx: &Rc<C>, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        // Stage objects are released when the guards drop, whatever the outcome.
        let vs = StageGuard::compile(ctx.as_ref(), Stage::Vertex, vertex)?;
        let fs = StageGuard::compile(ctx.as_ref(), Stage::Fragment, fragment)?;

        let id = ctx.link_program(vs.id, fs.id).map_err(|log| {
            log::error!("program link failed:\n{log}");
            ShaderError::Link { log }
        })?;

        log::debug!("linked program {id}");
        Ok(Self {
            ctx: Rc::clone(ctx),
            id,
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn context(&self) -> &Rc<C> {
        &self.ctx
    }

    /// Makes this program the active one for subsequent draws.
    pub fn activate(&self) {
        if let Err(err) = self.ctx.use_program(self.id) {
            // Unreachable while `self` holds the handle.
            log::error!("activating program {}: {err}", self.id);
        }
    }

    /// Whether this program is the active one on its context.
    pub fn is_active(&self) -> bool {
        self.ctx.active_program() == Some(self.id)
    }

    /// Resolves an active uniform of this program by name.
    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation, ShaderError> {
        self.ctx
            .uniform_location(self.id, name)
            .ok_or_else(|| ShaderError::UniformNotFound {
                name: name.to_string(),
            })
    }

    /// Writes `value` into the uniform called `name`.
    ///
    /// The location is looked up on this program; the write lands in the
    /// active program.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> Result<(), ShaderError> {
        let location = self.uniform_location(name)?;
        self.ctx.set_uniform(location, value.into())?;
        Ok(())
    }

    /// Current value of the uniform called `name` in this program.
    ///
    /// Samplers have no value and report `UniformNotFound` as well.
    pub fn uniform(&self, name: &str) -> Result<UniformValue, ShaderError> {
        let location = self.uniform_location(name)?;
        self.ctx
            .uniform_value(self.id, location)
            .ok_or_else(|| ShaderError::UniformNotFound {
                name: name.to_string(),
            })
    }
}

impl<C: GraphicsContext> Drop for Program<C> {
    fn drop(&mut self) {
        self.ctx.delete_program(self.id);
        log::debug!("deleted program {}", self.id);
    }
}

/// Compiled stage that is deleted when the guard goes out of scope.
struct StageGuard<'a, C: GraphicsContext> {
    ctx: &'a C,
    id: StageId,
}

impl<'a, C: GraphicsContext> StageGuard<'a, C> {
    fn compile(ctx: &'a C, stage: Stage, source: &str) -> Result<Self, ShaderError> {
        match ctx.compile_stage(stage, source) {
            Ok(id) => Ok(Self { ctx, id }),
            Err(log) => {
                log::error!("{stage} shader compilation failed:\n{log}");
                Err(ShaderError::Compile { stage, log })
            }
        }
    }
}

impl<C: GraphicsContext> Drop for StageGuard<'_, C> {
    fn drop(&mut self) {
        self.ctx.delete_stage(self.id);
    }
}
