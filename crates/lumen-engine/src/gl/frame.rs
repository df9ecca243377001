use std::ops::BitOr;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Which buffers [`GlContext::clear`](super::GlContext::clear) resets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: Self = Self {
        color: true,
        depth: false,
    };
    pub const DEPTH: Self = Self {
        color: false,
        depth: true,
    };
}

impl BitOr for ClearMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            color: self.color || rhs.color,
            depth: self.depth || rhs.depth,
        }
    }
}

/// Draw rectangle in target pixels, origin top-left.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole `width` x `height` target.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Intersection with a `width` x `height` target, or `None` when nothing
    /// of the viewport is left.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<Self> {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let w = self.width.min(width - x);
        let h = self.height.min(height - y);
        (w > 0 && h > 0).then_some(Self::new(x, y, w, h))
    }
}

/// Depth attachment owned by the context, sized to the current target.
pub(crate) struct DepthBuffer {
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    /// Freshly created; the next pass must clear it before testing against it.
    pub needs_clear: bool,
}

impl DepthBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen depth buffer"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        log::debug!("created {width}x{height} depth buffer");

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            width,
            height,
            needs_clear: true,
        }
    }

    pub fn attachment(&self, clear: bool) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        let load = if clear || self.needs_clear {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_combine() {
        let both = ClearMask::COLOR | ClearMask::DEPTH;
        assert!(both.color && both.depth);
        assert_eq!(ClearMask::default(), ClearMask { color: false, depth: false });
    }

    #[test]
    fn viewport_is_clamped_to_the_target() {
        let vp = Viewport::full(800, 600);
        assert_eq!(vp.clamp_to(400, 300), Some(Viewport::full(400, 300)));
        assert_eq!(
            Viewport::new(100, 50, 800, 600).clamp_to(400, 300),
            Some(Viewport::new(100, 50, 300, 250))
        );
        assert_eq!(Viewport::new(500, 0, 10, 10).clamp_to(400, 300), None);
    }
}
