use std::cell::RefCell;

use crate::shader::{Stage, UniformValue};

use super::state::ShaderState;
use super::{ContextError, GraphicsContext, ProgramId, StageId, UniformLocation};

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CompileStage(Stage),
    LinkProgram { vertex: StageId, fragment: StageId },
    DeleteStage(StageId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    SetUniform(UniformLocation, UniformValue),
}

/// CPU-only context.
///
/// Compiles and links with the same rules as the GPU context and keeps
/// program state in memory, but owns no device. Every call is logged so tests
/// can assert on the exact sequence a wrapper issued. Also handy for checking
/// shaders on machines without a usable adapter.
#[derive(Default)]
pub struct RecordingContext {
    state: RefCell<ShaderState<()>>,
    calls: RefCell<Vec<Call>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the calls made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Stage objects currently alive.
    pub fn live_stages(&self) -> usize {
        self.state.borrow().stage_count()
    }

    /// Program objects currently alive.
    pub fn live_programs(&self) -> usize {
        self.state.borrow().program_count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl GraphicsContext for RecordingContext {
    fn compile_stage(&self, stage: Stage, source: &str) -> Result<StageId, String> {
        self.record(Call::CompileStage(stage));
        self.state.borrow_mut().compile_stage(stage, source)
    }

    fn link_program(&self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String> {
        self.record(Call::LinkProgram { vertex, fragment });
        self.state
            .borrow_mut()
            .link_program(vertex, fragment, |_, _, _| Ok(()))
    }

    fn delete_stage(&self, stage: StageId) {
        self.record(Call::DeleteStage(stage));
        self.state.borrow_mut().delete_stage(stage);
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(Call::DeleteProgram(program));
        self.state.borrow_mut().delete_program(program);
    }

    fn use_program(&self, program: ProgramId) -> Result<(), ContextError> {
        self.record(Call::UseProgram(program));
        self.state.borrow_mut().use_program(program)
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.state.borrow().active_program()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.state.borrow().uniform_location(program, name)
    }

    fn set_uniform(
        &self,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), ContextError> {
        self.record(Call::SetUniform(location, value));
        self.state.borrow_mut().set_uniform(location, value)
    }

    fn uniform_value(
        &self,
        program: ProgramId,
        location: UniformLocation,
    ) -> Option<UniformValue> {
        self.state.borrow().uniform_value(program, location)
    }
}
