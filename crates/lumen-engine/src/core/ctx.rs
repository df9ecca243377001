use std::rc::Rc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::gl::GlContext;
use crate::time::FrameTime;

/// Per-frame context passed to `core::App::on_frame`.
///
/// The context already targets the acquired surface texture.
pub struct FrameCtx<'a> {
    pub gl: &'a Rc<GlContext>,
    pub window: &'a Window,
    /// Drawable size in physical pixels.
    pub size: PhysicalSize<u32>,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    /// Width over height of the drawable; 1.0 while minimized.
    pub fn aspect_ratio(&self) -> f32 {
        if self.size.width == 0 || self.size.height == 0 {
            return 1.0;
        }
        self.size.width as f32 / self.size.height as f32
    }
}
