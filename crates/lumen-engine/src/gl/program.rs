//! GPU objects behind one linked program.

use std::collections::HashMap;

use crate::context::TextureId;
use crate::shader::{CompiledStage, LinkedLayout, UniformKind, UniformSlot, UniformValue};

use super::texture::GpuTexture;
use super::vertex::VertexLayout;

/// What a render pipeline is specialised for.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) struct PipelineKey {
    pub vertex_layout: VertexLayout,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// Context resources bound into a program's bind groups.
pub(crate) struct Bindings<'a> {
    pub units: &'a HashMap<u32, TextureId>,
    pub textures: &'a HashMap<TextureId, GpuTexture>,
    /// Sampled through units with no texture.
    pub placeholder: &'a GpuTexture,
    pub sampler: &'a wgpu::Sampler,
    /// Changes whenever unit bindings or the sampler change.
    pub epoch: u64,
}

impl<'a> Bindings<'a> {
    fn unit_view(&self, unit: u32) -> &'a wgpu::TextureView {
        let texture = self
            .units
            .get(&unit)
            .and_then(|id| self.textures.get(id))
            .unwrap_or(self.placeholder);
        &texture.view
    }
}

pub(crate) struct GpuProgram {
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,

    group_layouts: Vec<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,

    /// One uniform buffer per value slot; `None` for textures and samplers.
    buffers: Vec<Option<wgpu::Buffer>>,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    bind_groups: Vec<wgpu::BindGroup>,
    /// `(bindings epoch, texture revision)` the bind groups were built for.
    bind_groups_key: Option<(u64, u64)>,
}

impl GpuProgram {
    pub fn new(
        device: &wgpu::Device,
        layout: &LinkedLayout,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
    ) -> Self {
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen vertex stage"),
            source: wgpu::ShaderSource::Wgsl(vertex.source.as_str().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen fragment stage"),
            source: wgpu::ShaderSource::Wgsl(fragment.source.as_str().into()),
        });

        // Gaps in the group numbering still need an (empty) layout.
        let group_layouts: Vec<wgpu::BindGroupLayout> = (0..layout.group_count())
            .map(|group| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
                    .uniforms
                    .iter()
                    .filter(|u| u.group == group)
                    .map(layout_entry)
                    .collect();

                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("lumen program bgl"),
                    entries: &entries,
                })
            })
            .collect();

        let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen program pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let buffers = layout
            .uniforms
            .iter()
            .map(|u| {
                u.kind.buffer_size().map(|size| {
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(u.name.as_str()),
                        size,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    })
                })
            })
            .collect();

        Self {
            vertex_module,
            fragment_module,
            vertex_entry: layout.vertex_entry.clone(),
            fragment_entry: layout.fragment_entry.clone(),
            group_layouts,
            pipeline_layout,
            buffers,
            pipelines: HashMap::new(),
            bind_groups: Vec::new(),
            bind_groups_key: None,
        }
    }

    /// Uploads every dirty value slot and clears its dirty flag.
    pub fn upload_dirty(
        &self,
        queue: &wgpu::Queue,
        values: &[Option<UniformValue>],
        dirty: &mut [bool],
    ) {
        for (index, flag) in dirty.iter_mut().enumerate() {
            if !*flag {
                continue;
            }
            if let (Some(value), Some(Some(buffer))) = (values[index], self.buffers.get(index)) {
                queue.write_buffer(buffer, 0, value.as_bytes());
            }
            *flag = false;
        }
    }

    pub fn has_pipeline(&self, key: &PipelineKey) -> bool {
        self.pipelines.contains_key(key)
    }

    /// Builds the pipeline for `key` without caching it. wgpu reports
    /// mismatches between the layout and the shaders as validation errors.
    pub fn build_pipeline(&self, device: &wgpu::Device, key: &PipelineKey) -> wgpu::RenderPipeline {
        let attributes = key.vertex_layout.wgpu_attributes();
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: key.vertex_layout.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        let depth_stencil = key.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen program pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(self.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some(self.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    pub fn insert_pipeline(&mut self, key: PipelineKey, pipeline: wgpu::RenderPipeline) {
        log::debug!(
            "created pipeline for {:?} (depth {:?})",
            key.color_format,
            key.depth_format
        );
        self.pipelines.insert(key, pipeline);
    }

    /// Rebuilds the bind groups when texture units, the sampler or a texture
    /// uniform changed since the last build.
    pub fn ensure_bind_groups(
        &mut self,
        device: &wgpu::Device,
        layout: &LinkedLayout,
        values: &[Option<UniformValue>],
        texture_revision: u64,
        bindings: &Bindings<'_>,
    ) {
        let key = (bindings.epoch, texture_revision);
        if self.bind_groups_key == Some(key) {
            return;
        }

        let mut groups = Vec::with_capacity(self.group_layouts.len());

        for (group, bgl) in self.group_layouts.iter().enumerate() {
            let mut entries = Vec::new();

            for (index, slot) in layout.uniforms.iter().enumerate() {
                if slot.group as usize != group {
                    continue;
                }

                let resource = match slot.kind {
                    UniformKind::Texture => {
                        let unit = match values[index] {
                            Some(UniformValue::Int(unit)) => unit.max(0) as u32,
                            _ => 0,
                        };
                        wgpu::BindingResource::TextureView(bindings.unit_view(unit))
                    }
                    UniformKind::Sampler => wgpu::BindingResource::Sampler(bindings.sampler),
                    _ => match &self.buffers[index] {
                        Some(buffer) => buffer.as_entire_binding(),
                        None => continue,
                    },
                };

                entries.push(wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource,
                });
            }

            groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen program bind group"),
                layout: bgl,
                entries: &entries,
            }));
        }

        self.bind_groups = groups;
        self.bind_groups_key = Some(key);
    }

    pub fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn bind_groups(&self) -> &[wgpu::BindGroup] {
        &self.bind_groups
    }
}

fn layout_entry(slot: &UniformSlot) -> wgpu::BindGroupLayoutEntry {
    let mut visibility = wgpu::ShaderStages::NONE;
    if slot.vertex {
        visibility |= wgpu::ShaderStages::VERTEX;
    }
    if slot.fragment {
        visibility |= wgpu::ShaderStages::FRAGMENT;
    }

    let ty = match slot.kind {
        UniformKind::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        UniformKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        _ => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
    };

    wgpu::BindGroupLayoutEntry {
        binding: slot.binding,
        visibility,
        ty,
        count: None,
    }
}
