use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use super::{GpuInit, WindowSurface};

/// Owns the wgpu adapter, device and queue.
///
/// The surface is kept separately in [`WindowSurface`] so that a context can
/// also be created with no window at all (see [`Gpu::headless`]).
pub struct Gpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates a GPU bound to a window and the configured surface for it.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<(Self, WindowSurface)> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = create_instance();

        // Sharing the window through `Arc` gives a `'static` surface.
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let gpu = Self::with_instance(&instance, Some(&surface), &init).await?;
        let surface = WindowSurface::configure(&gpu, window, surface, &init)?;

        Ok((gpu, surface))
    }

    /// Creates a GPU with no surface, for offscreen rendering and tests.
    pub async fn headless(init: GpuInit) -> Result<Self> {
        let instance = create_instance();
        Self::with_instance(&instance, None, &init).await
    }

    async fn with_instance(
        instance: &wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
        init: &GpuInit,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Returns a reference to the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

fn create_instance() -> wgpu::Instance {
    // Use all backends to allow wgpu to select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}
