use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::{FrameTarget, Gpu, GpuInit, SurfaceErrorAction, SurfaceFrame};

/// The swapchain of one window.
pub struct WindowSurface {
    window: Arc<Window>,

    surface: wgpu::Surface<'static>,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
}

impl WindowSurface {
    pub(super) fn configure(
        gpu: &Gpu,
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        init: &GpuInit,
    ) -> Result<Self> {
        let size = window.inner_size();

        let caps = surface.get_capabilities(gpu.adapter());
        let format =
            choose_surface_format(&caps, init.prefer_srgb).context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(gpu.device(), &config);
        log::debug!("surface configured: {format:?} {}x{}", config.width, config.height);

        Ok(Self {
            window,
            surface,
            config,
            size,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns the active surface format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only internal state is updated and configuration is deferred.
    pub fn resize(&mut self, gpu: &Gpu, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(gpu.device(), &self.config);
    }

    /// Acquires the next surface texture.
    ///
    /// Errors are handled here and mapped to the action the caller should take.
    pub fn acquire(&mut self, gpu: &Gpu) -> Result<SurfaceFrame, SurfaceErrorAction> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(SurfaceErrorAction::SkipFrame);
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => return Err(self.handle_surface_error(gpu, err)),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(SurfaceFrame {
            target: FrameTarget {
                view,
                format: self.config.format,
                width: surface_texture.texture.width(),
                height: surface_texture.texture.height(),
            },
            surface_texture,
        })
    }

    /// Presents a texture returned by [`acquire`](Self::acquire).
    ///
    /// All work rendering into it must already be submitted.
    pub fn present(&self, surface_texture: wgpu::SurfaceTexture) {
        self.window.pre_present_notify();
        surface_texture.present();
    }

    fn handle_surface_error(&mut self, gpu: &Gpu, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::classify(&err);
        match action {
            SurfaceErrorAction::Reconfigured => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(gpu.device(), &self.config);
                }
            }
            SurfaceErrorAction::SkipFrame => log::debug!("skipping frame: {err}"),
            SurfaceErrorAction::Fatal => log::error!("surface acquire failed: {err}"),
        }
        action
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    let preferred = caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == prefer_srgb);

    Some(preferred.unwrap_or(caps.formats[0]))
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
