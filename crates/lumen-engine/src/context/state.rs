//! Program bookkeeping shared by every context implementation.
//!
//! `ShaderState` tracks stage and program objects, the active program and the
//! uniform values of each program. Contexts attach their own per-program data
//! through the `P` payload (GPU objects for `GlContext`, nothing for the
//! recording context).

use std::collections::HashMap;

use crate::shader::{self, CompiledStage, LinkedLayout, Stage, UniformValue};

use super::ids::IdAllocator;
use super::{ContextError, ProgramId, StageId, UniformLocation};

const EXHAUSTED: &str = "the context has run out of object handles";

pub(crate) struct ProgramEntry<P> {
    pub layout: LinkedLayout,
    /// Current value per uniform slot; `None` for samplers and unsupported kinds.
    pub values: Vec<Option<UniformValue>>,
    /// Slots written since the payload last consumed them.
    pub dirty: Vec<bool>,
    /// Bumped whenever a texture uniform changes its unit.
    pub texture_revision: u64,
    pub payload: P,
}

pub(crate) struct ShaderState<P> {
    ids: IdAllocator,
    stages: HashMap<StageId, CompiledStage>,
    programs: HashMap<ProgramId, ProgramEntry<P>>,
    active: Option<ProgramId>,
}

impl<P> Default for ShaderState<P> {
    fn default() -> Self {
        Self {
            ids: IdAllocator::default(),
            stages: HashMap::new(),
            programs: HashMap::new(),
            active: None,
        }
    }
}

impl<P> ShaderState<P> {
    pub fn compile_stage(&mut self, stage: Stage, source: &str) -> Result<StageId, String> {
        let compiled = shader::compile(stage, source)?;
        let id = StageId::new(self.ids.next().ok_or(EXHAUSTED)?);
        self.stages.insert(id, compiled);
        Ok(id)
    }

    /// Links two stages; `build` creates the context payload once the
    /// interface checks passed.
    pub fn link_program<F>(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        build: F,
    ) -> Result<ProgramId, String>
    where
        F: FnOnce(&LinkedLayout, &CompiledStage, &CompiledStage) -> Result<P, String>,
    {
        let vs = self
            .stages
            .get(&vertex)
            .ok_or_else(|| format!("{vertex} is not a compiled stage object"))?;
        let fs = self
            .stages
            .get(&fragment)
            .ok_or_else(|| format!("{fragment} is not a compiled stage object"))?;

        let layout = shader::link(vs, fs)?;
        let raw_id = self.ids.next().ok_or(EXHAUSTED)?;
        let payload = build(&layout, vs, fs)?;

        let values: Vec<Option<UniformValue>> = layout
            .uniforms
            .iter()
            .map(|u| UniformValue::initial(u.kind))
            .collect();
        let dirty = vec![true; values.len()];

        let id = ProgramId::new(raw_id);
        self.programs.insert(
            id,
            ProgramEntry {
                layout,
                values,
                dirty,
                texture_revision: 0,
                payload,
            },
        );
        Ok(id)
    }

    pub fn delete_stage(&mut self, stage: StageId) -> bool {
        self.stages.remove(&stage).is_some()
    }

    pub fn delete_program(&mut self, program: ProgramId) -> Option<ProgramEntry<P>> {
        if self.active == Some(program) {
            self.active = None;
        }
        self.programs.remove(&program)
    }

    pub fn use_program(&mut self, program: ProgramId) -> Result<(), ContextError> {
        if !self.programs.contains_key(&program) {
            return Err(ContextError::InvalidProgram(program));
        }
        self.active = Some(program);
        Ok(())
    }

    pub fn active_program(&self) -> Option<ProgramId> {
        self.active
    }

    pub fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let entry = self.programs.get(&program)?;
        let index = entry.layout.find(name)?;
        Some(UniformLocation(index as u32))
    }

    pub fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), ContextError> {
        let program = self.active.ok_or(ContextError::NoActiveProgram)?;
        let entry = self
            .programs
            .get_mut(&program)
            .ok_or(ContextError::InvalidProgram(program))?;

        let index = location.index();
        let slot = entry
            .layout
            .uniforms
            .get(index)
            .ok_or(ContextError::InvalidLocation { program, location })?;

        if !value.fits(slot.kind) {
            return Err(ContextError::TypeMismatch {
                name: slot.name.clone(),
                expected: slot.kind,
                found: value.type_name(),
            });
        }

        if slot.kind == shader::UniformKind::Texture && entry.values[index] != Some(value) {
            entry.texture_revision += 1;
        }

        entry.values[index] = Some(value);
        entry.dirty[index] = true;
        Ok(())
    }

    pub fn uniform_value(
        &self,
        program: ProgramId,
        location: UniformLocation,
    ) -> Option<UniformValue> {
        let entry = self.programs.get(&program)?;
        entry.values.get(location.index()).copied().flatten()
    }

    pub fn program(&self, program: ProgramId) -> Option<&ProgramEntry<P>> {
        self.programs.get(&program)
    }

    pub fn program_mut(&mut self, program: ProgramId) -> Option<&mut ProgramEntry<P>> {
        self.programs.get_mut(&program)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::fixtures;

    fn linked(state: &mut ShaderState<()>) -> ProgramId {
        let vs = state.compile_stage(Stage::Vertex, fixtures::TEXTURED_VS).unwrap();
        let fs = state.compile_stage(Stage::Fragment, fixtures::TEXTURED_FS).unwrap();
        state.link_program(vs, fs, |_, _, _| Ok(())).unwrap()
    }

    #[test]
    fn uniforms_start_zeroed() {
        let mut state = ShaderState::<()>::default();
        let program = linked(&mut state);

        let mix = state.uniform_location(program, "mix_amount").unwrap();
        assert_eq!(state.uniform_value(program, mix), Some(UniformValue::Float(0.0)));

        let unit = state.uniform_location(program, "texture2").unwrap();
        assert_eq!(state.uniform_value(program, unit), Some(UniformValue::Int(0)));

        let sampler = state.uniform_location(program, "texture_sampler").unwrap();
        assert_eq!(state.uniform_value(program, sampler), None);
    }

    #[test]
    fn texture_unit_changes_bump_revision() {
        let mut state = ShaderState::<()>::default();
        let program = linked(&mut state);
        state.use_program(program).unwrap();

        let unit = state.uniform_location(program, "texture2").unwrap();
        state.set_uniform(unit, UniformValue::Int(1)).unwrap();
        state.set_uniform(unit, UniformValue::Int(1)).unwrap();

        assert_eq!(state.program(program).unwrap().texture_revision, 1);
    }

    #[test]
    fn unknown_stage_fails_to_link() {
        let mut state = ShaderState::<()>::default();
        let vs = state.compile_stage(Stage::Vertex, fixtures::SOLID_VS).unwrap();
        let fs = state.compile_stage(Stage::Fragment, fixtures::SOLID_FS).unwrap();
        assert!(state.delete_stage(fs));

        let err = state.link_program(vs, fs, |_, _, _| Ok(())).unwrap_err();
        assert!(err.contains("not a compiled stage object"), "{err}");
    }

    #[test]
    fn payload_failure_creates_no_program() {
        let mut state = ShaderState::<()>::default();
        let vs = state.compile_stage(Stage::Vertex, fixtures::SOLID_VS).unwrap();
        let fs = state.compile_stage(Stage::Fragment, fixtures::SOLID_FS).unwrap();

        let err = state
            .link_program(vs, fs, |_, _, _| Err("device lost".to_string()))
            .unwrap_err();
        assert_eq!(err, "device lost");
        assert_eq!(state.program_count(), 0);
    }

    #[test]
    fn exhausted_handles_fail_instead_of_aliasing() {
        let mut state = ShaderState::<()>::default();
        let vs = state.compile_stage(Stage::Vertex, fixtures::SOLID_VS).unwrap();
        let fs = state.compile_stage(Stage::Fragment, fixtures::SOLID_FS).unwrap();
        state.ids = IdAllocator::exhausted();

        let err = state.link_program(vs, fs, |_, _, _| Ok(())).unwrap_err();
        assert!(err.contains("run out of object handles"), "{err}");
        assert_eq!(state.program_count(), 0);
        assert!(state.compile_stage(Stage::Vertex, fixtures::SOLID_VS).is_err());
    }
}
