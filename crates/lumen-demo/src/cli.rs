use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "lumen-demo",
    version,
    about = "Ten textured cubes rotating under a moving camera"
)]
pub struct Cli {
    /// Directory holding `simple.vert.wgsl` and `simple.frag.wgsl`.
    #[arg(long, value_name = "DIR", default_value = "res/shaders")]
    pub shaders: PathBuf,

    /// Directory holding `container.png` and `awesomeface.png`.
    #[arg(long, value_name = "DIR", default_value = "res/img")]
    pub images: PathBuf,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    #[arg(long, default_value = "lumen")]
    pub title: String,

    /// Log filter in `env_logger` syntax (overrides `RUST_LOG`).
    #[arg(long, value_name = "FILTER", env = "LUMEN_LOG")]
    pub log: Option<String>,

    /// Compile and link the shaders without opening a window, then exit.
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    pub fn vertex_shader(&self) -> PathBuf {
        self.shaders.join("simple.vert.wgsl")
    }

    pub fn fragment_shader(&self) -> PathBuf {
        self.shaders.join("simple.frag.wgsl")
    }

    pub fn container_image(&self) -> PathBuf {
        self.images.join("container.png")
    }

    pub fn face_image(&self) -> PathBuf {
        self.images.join("awesomeface.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_bundled_resources() {
        let cli = Cli::try_parse_from(["lumen-demo"]).unwrap();
        assert_eq!(cli.vertex_shader(), PathBuf::from("res/shaders/simple.vert.wgsl"));
        assert_eq!(cli.face_image(), PathBuf::from("res/img/awesomeface.png"));
        assert_eq!((cli.width, cli.height), (800, 600));
        assert!(!cli.check);
    }

    #[test]
    fn paths_follow_the_directory_flags() {
        let cli = Cli::try_parse_from([
            "lumen-demo",
            "--shaders",
            "/tmp/s",
            "--images",
            "/tmp/i",
            "--check",
        ])
        .unwrap();
        assert_eq!(cli.fragment_shader(), PathBuf::from("/tmp/s/simple.frag.wgsl"));
        assert_eq!(cli.container_image(), PathBuf::from("/tmp/i/container.png"));
        assert!(cli.check);
    }
}
