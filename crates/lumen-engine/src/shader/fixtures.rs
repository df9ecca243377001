//! WGSL sources shared by the unit tests.

pub(crate) const TEXTURED_VS: &str = r#"
@group(0) @binding(0) var<uniform> model: mat4x4<f32>;
@group(0) @binding(1) var<uniform> view: mat4x4<f32>;
@group(0) @binding(2) var<uniform> projection: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) tex_coord: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = projection * view * model * vec4<f32>(position, 1.0);
    out.tex_coord = tex_coord;
    return out;
}
"#;

pub(crate) const TEXTURED_FS: &str = r#"
@group(1) @binding(0) var texture1: texture_2d<f32>;
@group(1) @binding(1) var texture2: texture_2d<f32>;
@group(1) @binding(2) var texture_sampler: sampler;
@group(1) @binding(3) var<uniform> mix_amount: f32;
@group(1) @binding(4) var<uniform> unused_tint: vec4<f32>;

@fragment
fn fs_main(@location(0) tex_coord: vec2<f32>) -> @location(0) vec4<f32> {
    let a = textureSample(texture1, texture_sampler, tex_coord);
    let b = textureSample(texture2, texture_sampler, tex_coord);
    return mix(a, b, mix_amount);
}
"#;

pub(crate) const SOLID_VS: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

pub(crate) const SOLID_FS: &str = r#"
@group(0) @binding(0) var<uniform> color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return color;
}
"#;

pub(crate) const SOLID_VS_WITH_OFFSET: &str = r#"
@group(0) @binding(0) var<uniform> offset: vec4<f32>;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0) + offset;
}
"#;

pub(crate) const VEC4_VARYING_VS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tint: vec4<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 1.0);
    out.tint = vec4<f32>(1.0);
    return out;
}
"#;

pub(crate) const BROKEN: &str = "@vertex fn vs_main( -> {";

pub(crate) const MODE_SWITCH_FS: &str = r#"
@group(0) @binding(0) var<uniform> color: vec4<f32>;
@group(0) @binding(1) var<uniform> mode: i32;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    if mode == 1 {
        return vec4<f32>(0.0, 1.0, 0.0, 1.0);
    }
    return color;
}
"#;

/// Uses bind group 4, one past the four groups every device supports.
pub(crate) const GROUP_4_FS: &str = r#"
@group(4) @binding(0) var<uniform> color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return color;
}
"#;

pub(crate) const INT_OUTPUT_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<i32> {
    return vec4<i32>(1, 0, 0, 1);
}
"#;
