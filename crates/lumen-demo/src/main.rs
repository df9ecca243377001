mod cli;
mod cubes;
mod scene;

use anyhow::{bail, Result};
use clap::Parser;
use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use crate::cli::Cli;
use crate::cubes::Cubes;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    if cli.check {
        let missing = cubes::check_shaders(&cli.vertex_shader(), &cli.fragment_shader())?;
        if !missing.is_empty() {
            bail!("shaders do not use uniforms: {}", missing.join(", "));
        }
        log::info!("shaders OK");
        return Ok(());
    }

    let config = RuntimeConfig {
        title: cli.title.clone(),
        initial_size: LogicalSize::new(f64::from(cli.width), f64::from(cli.height)),
    };

    Runtime::run(config, GpuInit::default(), move |gl| Cubes::new(gl, &cli))
}
