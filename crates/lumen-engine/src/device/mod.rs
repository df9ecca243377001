//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Adapter/Device/Queue, with or without a window
//! - creating & configuring the window Surface (swapchain)
//! - providing colour targets for rendering, on screen or offscreen

mod error;
mod frame;
mod gpu;
mod init;
mod offscreen;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::{FrameTarget, SurfaceFrame};
pub use gpu::Gpu;
pub use init::GpuInit;
pub use offscreen::OffscreenTarget;
pub use surface::WindowSurface;
