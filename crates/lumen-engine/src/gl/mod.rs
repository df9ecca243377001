//! GL-style immediate rendering on wgpu.
//!
//! [`GlContext`] implements [`GraphicsContext`](crate::context::GraphicsContext)
//! on a real device and adds the state a draw needs: vertex arrays, texture
//! units, a sampler, a viewport, depth testing and a frame target.

mod context;
mod frame;
mod program;
mod sampler;
mod texture;
mod vertex;

pub use context::GlContext;
pub use frame::{ClearMask, Viewport};
pub use sampler::{FilterMode, SamplerParams, WrapMode};
pub use vertex::{VertexAttribute, VertexLayout};
