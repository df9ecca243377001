use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use lumen_engine::context::{GraphicsContext, RecordingContext};
use lumen_engine::core::{App, AppControl, FrameCtx};
use lumen_engine::gl::{ClearMask, GlContext, SamplerParams, WrapMode};
use lumen_engine::mesh::Mesh;
use lumen_engine::shader::{Program, ShaderError, UniformValue};
use lumen_engine::texture::{Texture, TextureOptions};

use crate::cli::Cli;
use crate::scene;

const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

/// Uniforms the demo writes every frame or at startup.
pub const UNIFORMS: [&str; 5] = ["model", "view", "projection", "texture1", "texture2"];

pub struct Cubes {
    program: Program,
    mesh: Mesh,
    // Kept alive while bound to their units.
    _container: Texture,
    _face: Texture,
}

impl Cubes {
    pub fn new(gl: &Rc<GlContext>, cli: &Cli) -> Result<Self> {
        let program = Program::from_files(gl, cli.vertex_shader(), cli.fragment_shader())
            .context("failed to build the cube shader program")?;
        program.activate();

        gl.set_sampler_params(SamplerParams::trilinear(WrapMode::MirroredRepeat));

        let container = Texture::from_path(gl, cli.container_image(), TextureOptions::default())
            .context("failed to load the container texture")?;
        container.bind(0);
        set_uniform(&program, "texture1", 0);

        let face = Texture::from_path(
            gl,
            cli.face_image(),
            TextureOptions {
                flip_vertically: true,
                ..TextureOptions::default()
            },
        )
        .context("failed to load the face texture")?;
        face.bind(1);
        set_uniform(&program, "texture2", 1);

        gl.set_depth_test(true);

        let mesh = Mesh::cube(gl).context("failed to upload the cube mesh")?;
        log::info!(
            "scene ready: program {}, {} cubes of {} vertices",
            program.id(),
            scene::CUBE_POSITIONS.len(),
            mesh.vertex_count()
        );

        Ok(Self {
            program,
            mesh,
            _container: container,
            _face: face,
        })
    }
}

impl App for Cubes {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        set_uniform(&self.program, "view", scene::view(ctx.time.elapsed));
        set_uniform(
            &self.program,
            "projection",
            scene::projection(ctx.aspect_ratio()),
        );

        let gl = self.program.context();
        let [r, g, b, a] = CLEAR_COLOR;
        gl.set_clear_color(r, g, b, a);
        if let Err(err) = gl.clear(ClearMask::COLOR | ClearMask::DEPTH) {
            log::error!("clear failed: {err}");
            return AppControl::Exit;
        }

        for index in 0..scene::CUBE_POSITIONS.len() {
            set_uniform(&self.program, "model", scene::model(index));
            if let Err(err) = self.mesh.draw() {
                log::error!("drawing cube {index} failed: {err}");
                return AppControl::Exit;
            }
        }

        AppControl::Continue
    }
}

/// Writes a uniform, logging instead of failing.
///
/// An unknown name is only a warning: the shader may have optimised the
/// uniform away.
fn set_uniform<C: GraphicsContext>(
    program: &Program<C>,
    name: &str,
    value: impl Into<UniformValue>,
) {
    match program.set_uniform(name, value) {
        Ok(()) => {}
        Err(err @ ShaderError::UniformNotFound { .. }) => log::warn!("{err}"),
        Err(err) => log::error!("setting uniform '{name}': {err}"),
    }
}

/// Compiles and links the demo shaders without a device and reports which
/// of the demo's uniforms they expose.
pub fn check_shaders(vertex: &Path, fragment: &Path) -> Result<Vec<&'static str>> {
    let ctx = Rc::new(RecordingContext::new());
    let program = Program::from_files(&ctx, vertex, fragment).context("shader check failed")?;

    let mut missing = Vec::new();
    for name in UNIFORMS {
        match program.uniform_location(name) {
            Ok(location) => log::info!("uniform '{name}' at {location}"),
            Err(_) => {
                log::warn!("uniform '{name}' is not active");
                missing.push(name);
            }
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shader_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../res/shaders")
    }

    #[test]
    fn bundled_shaders_link_and_use_every_uniform() {
        let dir = shader_dir();
        let missing =
            check_shaders(&dir.join("simple.vert.wgsl"), &dir.join("simple.frag.wgsl")).unwrap();
        assert!(missing.is_empty(), "inactive uniforms: {missing:?}");
    }

    #[test]
    fn missing_shader_file_fails_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_shaders(&dir.path().join("a.wgsl"), &dir.path().join("b.wgsl"))
            .unwrap_err();
        let shader_err = err.downcast_ref::<ShaderError>().unwrap();
        assert!(matches!(shader_err, ShaderError::Io { .. }));
    }

    #[test]
    fn unknown_uniform_is_logged_not_fatal() {
        let ctx = Rc::new(RecordingContext::new());
        let dir = shader_dir();
        let program = Program::from_files(
            &ctx,
            dir.join("simple.vert.wgsl"),
            dir.join("simple.frag.wgsl"),
        )
        .unwrap();
        program.activate();

        set_uniform(&program, "texture1", 1);
        set_uniform(&program, "doesNotExist", 0);
        assert_eq!(program.uniform("texture1").unwrap(), UniformValue::Int(1));
    }
}
