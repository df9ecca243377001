use std::cell::RefCell;
use std::collections::HashMap;

use crate::context::ids::IdAllocator;
use crate::context::state::{ProgramEntry, ShaderState};
use crate::context::{
    ContextError, GraphicsContext, ProgramId, StageId, TextureId, UniformLocation, VertexArrayId,
};
use crate::device::{FrameTarget, Gpu};
use crate::shader::{Stage, UniformValue};
use crate::texture::{TextureError, TextureImage};

use super::frame::{ClearMask, DepthBuffer, Viewport, DEPTH_FORMAT};
use super::program::{Bindings, GpuProgram, PipelineKey};
use super::sampler::SamplerParams;
use super::texture::GpuTexture;
use super::vertex::{VertexArray, VertexLayout};

/// GPU-backed graphics context with GL-style immediate semantics.
///
/// State set on the context (active program, bound vertex array, texture
/// units, viewport, depth test) stays in effect until changed. Every draw is
/// submitted on its own, so uniform writes between two draws affect only the
/// second one.
///
/// Draws need a colour target: call [`begin_frame`](Self::begin_frame) with a
/// surface or offscreen target first.
pub struct GlContext {
    gpu: Gpu,
    shaders: RefCell<ShaderState<GpuProgram>>,
    state: RefCell<GlState>,
}

struct GlState {
    ids: IdAllocator,

    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    bound_vertex_array: Option<VertexArrayId>,

    textures: HashMap<TextureId, GpuTexture>,
    units: HashMap<u32, TextureId>,
    placeholder: GpuTexture,
    sampler_params: SamplerParams,
    sampler: wgpu::Sampler,
    /// Bumped whenever unit bindings or the sampler change.
    binding_epoch: u64,

    target: Option<FrameTarget>,
    depth: Option<DepthBuffer>,
    depth_test: bool,
    viewport: Option<Viewport>,
    clear_color: wgpu::Color,
}

impl GlContext {
    pub fn new(gpu: Gpu) -> Self {
        let placeholder = GpuTexture::upload(
            gpu.device(),
            gpu.queue(),
            "lumen placeholder texture",
            &TextureImage::solid(1, 1, [0, 0, 0, 255]),
            &[],
        );
        let sampler_params = SamplerParams::default();
        let sampler = sampler_params.create_sampler(gpu.device());

        let state = GlState {
            ids: IdAllocator::default(),
            vertex_arrays: HashMap::new(),
            bound_vertex_array: None,
            textures: HashMap::new(),
            units: HashMap::new(),
            placeholder,
            sampler_params,
            sampler,
            binding_epoch: 0,
            target: None,
            depth: None,
            depth_test: false,
            viewport: None,
            clear_color: wgpu::Color::BLACK,
        };

        Self {
            gpu,
            shaders: RefCell::new(ShaderState::default()),
            state: RefCell::new(state),
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    // ── vertex arrays ─────────────────────────────────────────────────────

    /// Uploads `data` as an interleaved vertex buffer described by `layout`.
    pub fn create_vertex_array(
        &self,
        layout: VertexLayout,
        data: &[u8],
    ) -> Result<VertexArrayId, ContextError> {
        use wgpu::util::DeviceExt;

        let mut state = self.state.borrow_mut();
        let id = VertexArrayId::new(state.ids.next().ok_or(ContextError::HandlesExhausted)?);

        let label = VertexArray::label(id);
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label.as_str()),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });

        let vertex_count = layout.vertex_count(data.len());
        log::debug!("created vertex array {id} ({vertex_count} vertices)");

        state.vertex_arrays.insert(
            id,
            VertexArray {
                buffer,
                layout,
                vertex_count,
            },
        );
        Ok(id)
    }

    /// Binds a vertex array for subsequent draws; `None` unbinds.
    pub fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) -> Result<(), ContextError> {
        let mut state = self.state.borrow_mut();
        if let Some(id) = vertex_array {
            if !state.vertex_arrays.contains_key(&id) {
                return Err(ContextError::InvalidVertexArray(id));
            }
        }
        state.bound_vertex_array = vertex_array;
        Ok(())
    }

    /// Unknown IDs are ignored. Deleting the bound array unbinds it.
    pub fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut state = self.state.borrow_mut();
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
        if state.vertex_arrays.remove(&vertex_array).is_some() {
            log::debug!("deleted vertex array {vertex_array}");
        }
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Uploads `image` as a new texture, with a full mip chain when
    /// `mipmaps` is set.
    ///
    /// Fails with [`TextureError::TooLarge`] when either side exceeds the
    /// device's `max_texture_dimension_2d`.
    pub fn create_texture(
        &self,
        image: &TextureImage,
        mipmaps: bool,
    ) -> Result<TextureId, TextureError> {
        let max = self.gpu.device().limits().max_texture_dimension_2d;
        if image.width() > max || image.height() > max {
            return Err(TextureError::TooLarge {
                width: image.width(),
                height: image.height(),
                max,
            });
        }

        let mut state = self.state.borrow_mut();
        let id = TextureId::new(state.ids.next().ok_or(ContextError::HandlesExhausted)?);

        let mips = if mipmaps { image.mip_chain() } else { Vec::new() };
        let texture = GpuTexture::upload(
            self.gpu.device(),
            self.gpu.queue(),
            &format!("lumen texture {id}"),
            image,
            &mips,
        );

        log::debug!(
            "created texture {id} ({}x{}, {} levels)",
            texture.width,
            texture.height,
            mips.len() + 1
        );
        state.textures.insert(id, texture);
        Ok(id)
    }

    /// Makes `texture` the one sampled through `unit`; `None` leaves the unit
    /// empty (it then samples opaque black).
    pub fn bind_texture_unit(&self, unit: u32, texture: Option<TextureId>) -> Result<(), ContextError> {
        let mut state = self.state.borrow_mut();
        match texture {
            Some(id) if !state.textures.contains_key(&id) => {
                return Err(ContextError::InvalidTexture(id));
            }
            Some(id) => {
                if state.units.insert(unit, id) != Some(id) {
                    state.binding_epoch += 1;
                }
            }
            None => {
                if state.units.remove(&unit).is_some() {
                    state.binding_epoch += 1;
                }
            }
        }
        Ok(())
    }

    /// Unknown IDs are ignored. Units the texture was bound to become empty.
    pub fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture).is_none() {
            return;
        }
        state.units.retain(|_, bound| *bound != texture);
        state.binding_epoch += 1;
        log::debug!("deleted texture {texture}");
    }

    pub fn set_sampler_params(&self, params: SamplerParams) {
        let mut state = self.state.borrow_mut();
        if state.sampler_params == params {
            return;
        }
        state.sampler = params.create_sampler(self.gpu.device());
        state.sampler_params = params;
        state.binding_epoch += 1;
    }

    // ── frame state ───────────────────────────────────────────────────────

    /// Directs clears and draws at `target` until [`end_frame`](Self::end_frame).
    pub fn begin_frame(&self, target: FrameTarget) {
        let mut state = self.state.borrow_mut();
        state.target = Some(target);
    }

    /// Releases the frame target. All its work has already been submitted.
    pub fn end_frame(&self) {
        self.state.borrow_mut().target = None;
    }

    /// `None` covers the whole target.
    pub fn set_viewport(&self, viewport: Option<Viewport>) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        };
    }

    /// Enables depth testing (`Less`, depth writes on) for subsequent draws.
    pub fn set_depth_test(&self, enabled: bool) {
        self.state.borrow_mut().depth_test = enabled;
    }

    pub fn depth_test(&self) -> bool {
        self.state.borrow().depth_test
    }

    pub fn clear(&self, mask: ClearMask) -> Result<(), ContextError> {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;

        let target = state.target.as_ref().ok_or(ContextError::NoRenderTarget)?;
        if !mask.color && !mask.depth {
            return Ok(());
        }

        if mask.depth {
            ensure_depth(self.gpu.device(), &mut state.depth, target);
        }

        let color_load = if mask.color {
            wgpu::LoadOp::Clear(state.clear_color)
        } else {
            wgpu::LoadOp::Load
        };

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen clear encoder"),
            });

        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: match (&state.depth, mask.depth) {
                    (Some(depth), true) => Some(depth.attachment(true)),
                    _ => None,
                },
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));

        if mask.depth {
            if let Some(depth) = state.depth.as_mut() {
                depth.needs_clear = false;
            }
        }
        Ok(())
    }

    // ── draw ──────────────────────────────────────────────────────────────

    /// Draws `count` vertices starting at `first` from the bound vertex array
    /// with the active program, as a triangle list.
    pub fn draw_arrays(&self, first: u32, count: u32) -> Result<(), ContextError> {
        let mut shaders = self.shaders.borrow_mut();
        let mut state = self.state.borrow_mut();
        let state = &mut *state;

        let program = shaders
            .active_program()
            .ok_or(ContextError::NoActiveProgram)?;
        let target = state.target.as_ref().ok_or(ContextError::NoRenderTarget)?;

        let vao_id = state
            .bound_vertex_array
            .ok_or(ContextError::NoVertexArray)?;
        let vao = state
            .vertex_arrays
            .get(&vao_id)
            .ok_or(ContextError::InvalidVertexArray(vao_id))?;

        let end = first.saturating_add(count);
        if end > vao.vertex_count {
            return Err(ContextError::DrawOutOfRange {
                first,
                end,
                available: vao.vertex_count,
            });
        }

        let ProgramEntry {
            layout,
            values,
            dirty,
            texture_revision,
            payload,
        } = shaders
            .program_mut(program)
            .ok_or(ContextError::InvalidProgram(program))?;

        for (location, expected) in &layout.vertex_inputs {
            let Some(attribute) = vao.layout.attribute(*location) else {
                return Err(ContextError::MissingVertexAttribute {
                    location: *location,
                });
            };
            if attribute.scalar_kind() != expected.scalar.kind {
                return Err(ContextError::VertexAttributeType {
                    location: *location,
                    format: attribute.format,
                    expected: *expected,
                });
            }
        }

        if count == 0 {
            return Ok(());
        }
        let Some(viewport) = state
            .viewport
            .unwrap_or(Viewport::full(target.width, target.height))
            .clamp_to(target.width, target.height)
        else {
            return Ok(());
        };

        payload.upload_dirty(self.gpu.queue(), values, dirty);

        // Mutating steps first, immutable borrows of the caches after.
        let depth_format = if state.depth_test {
            ensure_depth(self.gpu.device(), &mut state.depth, target);
            Some(DEPTH_FORMAT)
        } else {
            None
        };

        let key = PipelineKey {
            vertex_layout: vao.layout.clone(),
            color_format: target.format,
            depth_format,
        };
        if !payload.has_pipeline(&key) {
            let device = self.gpu.device();
            let pipeline = validated(device, || payload.build_pipeline(device, &key))
                .map_err(|log| ContextError::Pipeline { log })?;
            payload.insert_pipeline(key.clone(), pipeline);
        }
        payload.ensure_bind_groups(
            self.gpu.device(),
            layout,
            values,
            *texture_revision,
            &Bindings {
                units: &state.units,
                textures: &state.textures,
                placeholder: &state.placeholder,
                sampler: &state.sampler,
                epoch: state.binding_epoch,
            },
        );

        let Some(pipeline) = payload.pipeline(&key) else {
            return Ok(());
        };

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen draw encoder"),
            });

        {
            let depth_attachment = if depth_format.is_some() {
                state.depth.as_ref().map(|d| d.attachment(false))
            } else {
                None
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            rpass.set_pipeline(pipeline);
            for (index, group) in payload.bind_groups().iter().enumerate() {
                rpass.set_bind_group(index as u32, group, &[]);
            }
            rpass.set_vertex_buffer(0, vao.buffer.slice(..));
            rpass.draw(first..end, 0..1);
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));

        if depth_format.is_some() {
            if let Some(depth) = state.depth.as_mut() {
                depth.needs_clear = false;
            }
        }
        Ok(())
    }

    /// Number of live vertex arrays and textures, in that order.
    pub fn resource_counts(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.vertex_arrays.len(), state.textures.len())
    }
}

/// Runs `create` inside a validation error scope, turning a wgpu validation
/// error into `Err` instead of a panic from the uncaptured error handler.
fn validated<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, String> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => Err(err.to_string()),
    }
}

/// (Re)creates the depth buffer when missing or sized for another target.
fn ensure_depth(device: &wgpu::Device, depth: &mut Option<DepthBuffer>, target: &FrameTarget) {
    let fits = depth
        .as_ref()
        .is_some_and(|d| d.width == target.width && d.height == target.height);
    if !fits {
        *depth = Some(DepthBuffer::new(device, target.width, target.height));
    }
}

impl GraphicsContext for GlContext {
    fn compile_stage(&self, stage: Stage, source: &str) -> Result<StageId, String> {
        let id = self.shaders.borrow_mut().compile_stage(stage, source)?;
        log::debug!("compiled {stage} stage {id}");
        Ok(id)
    }

    fn link_program(&self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String> {
        let device = self.gpu.device();
        self.shaders
            .borrow_mut()
            .link_program(vertex, fragment, |layout, vs, fs| {
                validated(device, || GpuProgram::new(device, layout, vs, fs))
            })
    }

    fn delete_stage(&self, stage: StageId) {
        self.shaders.borrow_mut().delete_stage(stage);
    }

    fn delete_program(&self, program: ProgramId) {
        self.shaders.borrow_mut().delete_program(program);
    }

    fn use_program(&self, program: ProgramId) -> Result<(), ContextError> {
        self.shaders.borrow_mut().use_program(program)
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.shaders.borrow().active_program()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.shaders.borrow().uniform_location(program, name)
    }

    fn set_uniform(
        &self,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), ContextError> {
        self.shaders.borrow_mut().set_uniform(location, value)
    }

    fn uniform_value(
        &self,
        program: ProgramId,
        location: UniformLocation,
    ) -> Option<UniformValue> {
        self.shaders.borrow().uniform_value(program, location)
    }
}
