//! Stage compilation and program linking on top of naga.
//!
//! A stage compiles when its WGSL parses, validates and contains exactly one
//! entry point for that stage. Linking checks the vertex/fragment interface
//! and merges the uniforms both stages actually use into one table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, ImageClass, ImageDimension, ScalarKind, TypeInner, VectorSize};

/// Bind groups every wgpu device supports (`Limits::default().max_bind_groups`).
pub const MAX_BIND_GROUPS: u32 = 4;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an active uniform, as reflected from the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    /// `var<uniform> x: i32`
    Int,
    /// `var<uniform> x: f32`
    Float,
    /// `var<uniform> x: vec4<f32>`
    Vec4,
    /// `var<uniform> x: mat4x4<f32>`
    Mat4,
    /// `var x: texture_2d<f32>`; the value is a texture unit.
    Texture,
    /// `var s: sampler`; bound by the context, not settable.
    Sampler,
    /// Any other uniform type. Visible, but not settable.
    Other { size: u32 },
}

impl UniformKind {
    /// Size of the uniform buffer backing this kind, or `None` for resources
    /// that are not buffer-backed.
    ///
    /// Sizes are rounded up to 16 bytes.
    pub fn buffer_size(self) -> Option<u64> {
        let raw = match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
            UniformKind::Other { size } => u64::from(size),
            UniformKind::Texture | UniformKind::Sampler => return None,
        };
        Some(raw.max(1).div_ceil(16) * 16)
    }
}

/// Type of a value crossing a stage boundary (vertex input, varying).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct IoType {
    pub scalar: naga::Scalar,
    pub components: u8,
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalar = match self.scalar.kind {
            ScalarKind::Float => "f",
            ScalarKind::Sint => "i",
            ScalarKind::Uint => "u",
            _ => "?",
        };
        let bits = u32::from(self.scalar.width) * 8;
        if self.components == 1 {
            write!(f, "{scalar}{bits}")
        } else {
            write!(f, "vec{}<{scalar}{bits}>", self.components)
        }
    }
}

/// A uniform declared (and used) by one stage.
#[derive(Debug, Clone, PartialEq)]
struct DeclaredUniform {
    name: String,
    group: u32,
    binding: u32,
    kind: UniformKind,
}

/// A stage that parsed, validated and has a usable entry point.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub stage: Stage,
    pub source: String,
    pub entry_point: String,
    /// `(location, type)` of every user-defined input.
    pub inputs: Vec<(u32, IoType)>,
    /// `(location, type)` of every user-defined output.
    pub outputs: Vec<(u32, IoType)>,
    uniforms: Vec<DeclaredUniform>,
}

/// One active uniform of a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSlot {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: UniformKind,
    pub vertex: bool,
    pub fragment: bool,
}

/// Result of linking a vertex and a fragment stage.
#[derive(Debug, Clone)]
pub struct LinkedLayout {
    /// Active uniforms ordered by `(group, binding)`; a uniform location is an
    /// index into this list.
    pub uniforms: Vec<UniformSlot>,
    /// Vertex attributes the vertex stage reads.
    pub vertex_inputs: Vec<(u32, IoType)>,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

impl LinkedLayout {
    pub fn find(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }

    /// Number of bind groups the program needs (highest group index + 1).
    pub fn group_count(&self) -> u32 {
        self.uniforms.iter().map(|u| u.group + 1).max().unwrap_or(0)
    }
}

/// Compiles `source` as `stage`.
///
/// On failure the error string is the diagnostic log.
pub fn compile(stage: Stage, source: &str) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| error_chain(&e))?;

    let mut candidates = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| ep.stage == stage.naga_stage());

    let (index, entry) = match (candidates.next(), candidates.next()) {
        (Some(found), None) => found,
        (None, _) => return Err(format!("no @{stage} entry point")),
        (Some(_), Some(_)) => return Err(format!("more than one @{stage} entry point")),
    };

    let usage = info.get_entry_point(index);
    let mut uniforms = Vec::new();

    for (handle, var) in module.global_variables.iter() {
        if usage[handle].is_empty() {
            continue;
        }

        let ty = &module.types[var.ty].inner;
        let kind = match var.space {
            AddressSpace::Uniform => value_kind(&module, ty),
            AddressSpace::Handle => match *ty {
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class:
                        ImageClass::Sampled {
                            kind: ScalarKind::Float,
                            multi: false,
                        },
                } => UniformKind::Texture,
                TypeInner::Sampler { comparison: false } => UniformKind::Sampler,
                _ => {
                    return Err(format!(
                        "resource `{}`: only texture_2d<f32> and sampler are supported",
                        var.name.as_deref().unwrap_or("<unnamed>")
                    ))
                }
            },
            AddressSpace::Private | AddressSpace::Function | AddressSpace::WorkGroup => continue,
            _ => {
                return Err(format!(
                    "global `{}`: only uniform, texture and sampler resources are supported",
                    var.name.as_deref().unwrap_or("<unnamed>")
                ))
            }
        };

        let Some(binding) = var.binding.as_ref() else { continue };
        let Some(name) = var.name.clone() else {
            return Err("resource bindings must be named".to_string());
        };

        uniforms.push(DeclaredUniform {
            name,
            group: binding.group,
            binding: binding.binding,
            kind,
        });
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_io(&module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_io(&module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    Ok(CompiledStage {
        stage,
        source: source.to_string(),
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms,
    })
}

/// Links a compiled vertex stage with a compiled fragment stage.
///
/// On failure the error string is the link log.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<LinkedLayout, String> {
    if vertex.stage != Stage::Vertex {
        return Err(format!("expected a vertex stage, got a {} stage", vertex.stage));
    }
    if fragment.stage != Stage::Fragment {
        return Err(format!("expected a fragment stage, got a {} stage", fragment.stage));
    }

    let mut log = Vec::new();

    for (location, wanted) in &fragment.inputs {
        match vertex.outputs.iter().find(|(l, _)| l == location) {
            None => log.push(format!(
                "fragment input at location {location} is not written by the vertex stage"
            )),
            Some((_, written)) if written != wanted => log.push(format!(
                "location {location}: vertex stage writes {written} but fragment stage reads {wanted}"
            )),
            Some(_) => {}
        }
    }

    let mut merged: BTreeMap<String, UniformSlot> = BTreeMap::new();
    let stages = [(Stage::Vertex, vertex), (Stage::Fragment, fragment)];

    for (stage, compiled) in stages {
        for u in &compiled.uniforms {
            let slot = merged.entry(u.name.clone()).or_insert_with(|| UniformSlot {
                name: u.name.clone(),
                group: u.group,
                binding: u.binding,
                kind: u.kind,
                vertex: false,
                fragment: false,
            });

            if (slot.group, slot.binding, slot.kind) != (u.group, u.binding, u.kind) {
                log.push(format!(
                    "uniform `{}` is declared differently in the vertex and fragment stages",
                    u.name
                ));
                continue;
            }

            match stage {
                Stage::Vertex => slot.vertex = true,
                Stage::Fragment => slot.fragment = true,
            }
        }
    }

    let mut uniforms: Vec<UniformSlot> = merged.into_values().collect();
    uniforms.sort_by_key(|u| (u.group, u.binding));

    let mut owners: HashMap<(u32, u32), &str> = HashMap::new();
    for u in &uniforms {
        if let Some(other) = owners.insert((u.group, u.binding), &u.name) {
            log.push(format!(
                "uniforms `{other}` and `{}` share @group({}) @binding({})",
                u.name, u.group, u.binding
            ));
        }
    }

    for u in uniforms.iter().filter(|u| u.group >= MAX_BIND_GROUPS) {
        log.push(format!(
            "uniform `{}` uses @group({}); only groups 0..{MAX_BIND_GROUPS} are available",
            u.name, u.group
        ));
    }

    // Colour targets are always float formats.
    for (location, written) in &fragment.outputs {
        if written.scalar.kind != ScalarKind::Float {
            log.push(format!(
                "fragment output at location {location} is {written}; colour outputs must be floats"
            ));
        }
    }

    if !log.is_empty() {
        return Err(log.join("\n"));
    }

    Ok(LinkedLayout {
        uniforms,
        vertex_inputs: vertex.inputs.clone(),
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
    })
}

fn value_kind(module: &naga::Module, ty: &TypeInner) -> UniformKind {
    const F32: naga::Scalar = naga::Scalar {
        kind: ScalarKind::Float,
        width: 4,
    };
    const I32: naga::Scalar = naga::Scalar {
        kind: ScalarKind::Sint,
        width: 4,
    };

    match *ty {
        TypeInner::Scalar(s) if s == I32 => UniformKind::Int,
        TypeInner::Scalar(s) if s == F32 => UniformKind::Float,
        TypeInner::Vector {
            size: VectorSize::Quad,
            scalar,
        } if scalar == F32 => UniformKind::Vec4,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar == F32 => UniformKind::Mat4,
        ref other => UniformKind::Other {
            size: other.size(module.to_ctx()),
        },
    }
}

fn collect_io(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, IoType)>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => {
            let io = match *inner {
                TypeInner::Scalar(scalar) => Some(IoType {
                    scalar,
                    components: 1,
                }),
                TypeInner::Vector { size, scalar } => Some(IoType {
                    scalar,
                    components: size as u8,
                }),
                _ => None,
            };
            if let Some(io) = io {
                out.push((*location, io));
            }
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { ref members, .. } = *inner {
                for member in members {
                    collect_io(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
