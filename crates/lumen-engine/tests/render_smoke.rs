//! End-to-end rendering through `GlContext` into an offscreen target.
//!
//! Every test skips (with a warning) when the machine has no usable adapter.

use std::rc::Rc;

use glam::Vec4;
use lumen_engine::context::{ContextError, GraphicsContext};
use lumen_engine::device::{Gpu, GpuInit, OffscreenTarget};
use lumen_engine::gl::{ClearMask, GlContext, VertexAttribute, VertexLayout};
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::mesh::Mesh;
use lumen_engine::shader::{Program, ShaderError};
use lumen_engine::texture::{Texture, TextureError, TextureImage, TextureOptions};

const SIZE: u32 = 16;

const PASS_THROUGH_VS: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

const RED_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

const UNIFORM_COLOR_FS: &str = r#"
@group(0) @binding(0) var<uniform> color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return color;
}
"#;

const TEXTURED_VS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 1.0);
    out.uv = position.xy * 0.5 + vec2<f32>(0.5);
    return out;
}
"#;

const TEXTURED_FS: &str = r#"
@group(0) @binding(0) var color_map: texture_2d<f32>;
@group(0) @binding(1) var color_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(color_map, color_sampler, uv);
}
"#;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn context() -> Option<Rc<GlContext>> {
    init_logging(LoggingConfig::default());
    match pollster::block_on(Gpu::headless(GpuInit::default())) {
        Ok(gpu) => Some(Rc::new(GlContext::new(gpu))),
        Err(err) => {
            log::warn!("skipping GPU test: {err:#}");
            None
        }
    }
}

fn target(gl: &GlContext) -> OffscreenTarget {
    OffscreenTarget::new(gl.gpu(), SIZE, SIZE, wgpu::TextureFormat::Rgba8Unorm).unwrap()
}

/// Two triangles spanning `x0..x1` horizontally and the full height, at depth `z`.
fn quad(gl: &Rc<GlContext>, x0: f32, x1: f32, z: f32) -> Mesh {
    #[rustfmt::skip]
    let vertices = [
        x0, -1.0, z,   x1, -1.0, z,   x1, 1.0, z,
        x0, -1.0, z,   x1,  1.0, z,   x0, 1.0, z,
    ];
    Mesh::new(gl, VertexLayout::packed_f32(&[(0, 3)]), &vertices).unwrap()
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let at = ((y * SIZE + x) * 4) as usize;
    [pixels[at], pixels[at + 1], pixels[at + 2], pixels[at + 3]]
}

fn clear_black(gl: &GlContext) {
    gl.set_clear_color(0.0, 0.0, 0.0, 1.0);
    gl.clear(ClearMask::COLOR | ClearMask::DEPTH).unwrap();
}

#[test]
fn solid_colour_fills_every_covered_pixel() {
    let Some(gl) = context() else { return };
    let target = target(&gl);

    let program = Program::from_sources(&gl, PASS_THROUGH_VS, RED_FS).unwrap();
    let mesh = quad(&gl, -1.0, 1.0, 0.5);

    gl.begin_frame(target.frame_target());
    clear_black(&gl);
    program.activate();
    mesh.draw().unwrap();
    gl.end_frame();

    let pixels = target.read_rgba8(gl.gpu()).unwrap();
    assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);
    assert!(pixels.chunks(4).all(|p| p == RED));
}

#[test]
fn uniform_writes_apply_to_the_next_draw_only() {
    let Some(gl) = context() else { return };
    let target = target(&gl);

    let program = Program::from_sources(&gl, PASS_THROUGH_VS, UNIFORM_COLOR_FS).unwrap();
    let left = quad(&gl, -1.0, 0.0, 0.5);
    let right = quad(&gl, 0.0, 1.0, 0.5);

    gl.begin_frame(target.frame_target());
    clear_black(&gl);
    program.activate();

    program.set_uniform("color", Vec4::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    left.draw().unwrap();
    program.set_uniform("color", Vec4::new(0.0, 1.0, 0.0, 1.0)).unwrap();
    right.draw().unwrap();
    gl.end_frame();

    let pixels = target.read_rgba8(gl.gpu()).unwrap();
    for y in 0..SIZE {
        for x in 0..SIZE {
            let expected = if x < SIZE / 2 { BLUE } else { GREEN };
            assert_eq!(pixel(&pixels, x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn depth_test_keeps_the_nearer_surface() {
    let Some(gl) = context() else { return };
    let target = target(&gl);

    let program = Program::from_sources(&gl, PASS_THROUGH_VS, UNIFORM_COLOR_FS).unwrap();
    let near = quad(&gl, -1.0, 1.0, 0.2);
    let far = quad(&gl, -1.0, 1.0, 0.8);

    gl.set_depth_test(true);
    gl.begin_frame(target.frame_target());
    clear_black(&gl);
    program.activate();

    program.set_uniform("color", Vec4::new(0.0, 1.0, 0.0, 1.0)).unwrap();
    near.draw().unwrap();
    program.set_uniform("color", Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
    far.draw().unwrap();
    gl.end_frame();

    let pixels = target.read_rgba8(gl.gpu()).unwrap();
    assert!(pixels.chunks(4).all(|p| p == GREEN));
}

#[test]
fn texture_units_feed_texture_uniforms() {
    let Some(gl) = context() else { return };
    let target = target(&gl);

    let program = Program::from_sources(&gl, TEXTURED_VS, TEXTURED_FS).unwrap();
    let mesh = quad(&gl, -1.0, 1.0, 0.5);
    let green = Texture::from_image(
        &gl,
        &TextureImage::solid(4, 4, GREEN),
        TextureOptions {
            generate_mipmaps: false,
            ..TextureOptions::default()
        },
    )
    .unwrap();
    green.bind(1);

    gl.begin_frame(target.frame_target());
    clear_black(&gl);
    program.activate();

    // Unit 0 is empty and samples opaque black.
    program.set_uniform("color_map", 0).unwrap();
    mesh.draw().unwrap();
    let empty_unit = target.read_rgba8(gl.gpu()).unwrap();

    program.set_uniform("color_map", 1).unwrap();
    mesh.draw().unwrap();
    gl.end_frame();

    let bound_unit = target.read_rgba8(gl.gpu()).unwrap();
    assert!(empty_unit.chunks(4).all(|p| p == BLACK));
    assert!(bound_unit.chunks(4).all(|p| p == GREEN));
}

#[test]
fn draws_report_missing_state() {
    let Some(gl) = context() else { return };
    let target = target(&gl);
    let mesh = quad(&gl, -1.0, 1.0, 0.5);

    mesh.bind().unwrap();
    assert_eq!(gl.draw_arrays(0, 6), Err(ContextError::NoActiveProgram));

    let program = Program::from_sources(&gl, TEXTURED_VS, TEXTURED_FS).unwrap();
    program.activate();
    assert_eq!(gl.draw_arrays(0, 6), Err(ContextError::NoRenderTarget));

    gl.begin_frame(target.frame_target());
    assert_eq!(
        gl.draw_arrays(4, 6),
        Err(ContextError::DrawOutOfRange {
            first: 4,
            end: 10,
            available: 6
        })
    );

    let uv_only = Mesh::new(&gl, VertexLayout::packed_f32(&[(1, 2)]), &[0.0; 12]).unwrap();
    uv_only.bind().unwrap();
    assert_eq!(
        gl.draw_arrays(0, 6),
        Err(ContextError::MissingVertexAttribute { location: 0 })
    );
    gl.end_frame();
}

#[test]
fn integer_attribute_feeding_a_float_input_is_rejected() {
    let Some(gl) = context() else { return };
    let target = target(&gl);

    let program = Program::from_sources(&gl, PASS_THROUGH_VS, RED_FS).unwrap();
    let layout = VertexLayout::new(
        12,
        vec![VertexAttribute {
            location: 0,
            format: wgpu::VertexFormat::Sint32x3,
            offset: 0,
        }],
    );
    let ints = Mesh::new(&gl, layout, &[0.0; 18]).unwrap();

    gl.begin_frame(target.frame_target());
    program.activate();
    let err = ints.draw().unwrap_err();
    assert!(
        matches!(err, ContextError::VertexAttributeType { location: 0, .. }),
        "{err}"
    );

    // A matching mesh still draws afterwards.
    quad(&gl, -1.0, 1.0, 0.5).draw().unwrap();
    gl.end_frame();
}

#[test]
fn shaders_the_device_cannot_run_fail_to_link() {
    let Some(gl) = context() else { return };

    let group_4 = r#"
@group(4) @binding(0) var<uniform> color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return color;
}
"#;
    let err = Program::from_sources(&gl, PASS_THROUGH_VS, group_4).err().unwrap();
    assert!(matches!(err, ShaderError::Link { .. }), "{err}");

    let int_output = r#"
@fragment
fn fs_main() -> @location(0) vec4<i32> {
    return vec4<i32>(1, 0, 0, 1);
}
"#;
    let err = Program::from_sources(&gl, PASS_THROUGH_VS, int_output).err().unwrap();
    assert!(matches!(err, ShaderError::Link { .. }), "{err}");

    assert!(Program::from_sources(&gl, PASS_THROUGH_VS, RED_FS).is_ok());
}

#[test]
fn oversized_texture_is_rejected_before_upload() {
    let Some(gl) = context() else { return };

    let max = gl.gpu().device().limits().max_texture_dimension_2d;
    let wide = TextureImage::solid(max + 1, 1, RED);
    let err = Texture::from_image(&gl, &wide, TextureOptions::default())
        .err()
        .unwrap();
    assert!(
        matches!(err, TextureError::TooLarge { width, max: limit, .. } if width == max + 1 && limit == max),
        "{err}"
    );
    assert_eq!(gl.resource_counts(), (0, 0));
}

#[test]
fn dropped_program_handle_is_stale() {
    let Some(gl) = context() else { return };

    let program = Program::from_sources(&gl, PASS_THROUGH_VS, RED_FS).unwrap();
    let stale = program.id();
    program.activate();
    drop(program);

    assert_eq!(gl.active_program(), None);
    assert_eq!(gl.use_program(stale), Err(ContextError::InvalidProgram(stale)));

    let fresh = Program::from_sources(&gl, PASS_THROUGH_VS, RED_FS).unwrap();
    assert_ne!(fresh.id(), stale);
}

#[test]
fn broken_shader_is_reported_not_fatal() {
    let Some(gl) = context() else { return };

    let err = Program::from_sources(&gl, "@vertex fn nope(", RED_FS).err().unwrap();
    assert!(matches!(err, ShaderError::Compile { .. }));

    // The context is still usable.
    assert!(Program::from_sources(&gl, PASS_THROUGH_VS, RED_FS).is_ok());
}

#[test]
fn meshes_and_textures_are_released_on_drop() {
    let Some(gl) = context() else { return };

    let mesh = Mesh::cube(&gl).unwrap();
    let texture =
        Texture::from_image(&gl, &TextureImage::solid(2, 2, RED), TextureOptions::default())
            .unwrap();
    assert_eq!(gl.resource_counts(), (1, 1));

    drop(mesh);
    drop(texture);
    assert_eq!(gl.resource_counts(), (0, 0));
}
