//! Lumen engine crate.
//!
//! This crate owns the platform, GPU and shader-program pieces used by the
//! demo binary. Rendering goes through an explicit context handle
//! ([`context::GraphicsContext`]) instead of process-global GPU state.

pub mod context;
pub mod core;
pub mod device;
pub mod gl;
pub mod logging;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod time;
pub mod window;
