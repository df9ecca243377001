/// A colour attachment the graphics context renders into.
///
/// Either the view of an acquired surface texture or of an
/// [`OffscreenTarget`](super::OffscreenTarget).
pub struct FrameTarget {
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// Represents a single acquired surface frame.
///
/// This object is short-lived and must be finalized promptly. Holding the surface
/// texture prevents acquisition of subsequent frames.
pub struct SurfaceFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub target: FrameTarget,
}
