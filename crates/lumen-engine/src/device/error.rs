/// What the runtime should do after acquiring a surface texture failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; the next frame can render.
    Reconfigured,
    /// Nothing to draw into this time; try again next frame.
    SkipFrame,
    /// The device ran out of memory. Stop the loop.
    Fatal,
}

impl SurfaceErrorAction {
    /// Maps an acquire error to an action. Lost and outdated surfaces must be
    /// reconfigured by the caller before returning `Reconfigured`.
    pub(super) fn classify(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }
}
