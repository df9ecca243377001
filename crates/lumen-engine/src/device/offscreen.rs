use std::sync::mpsc;

use anyhow::{Context, Result};

use super::{FrameTarget, Gpu};

/// A colour texture that can be rendered into and read back.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    /// Creates a `width` x `height` target. `format` must be a 4-byte colour
    /// format for [`read_rgba8`](Self::read_rgba8) to work.
    pub fn new(gpu: &Gpu, width: u32, height: u32, format: wgpu::TextureFormat) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        Ok(Self {
            texture,
            format,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// A fresh view of the texture to pass to `GlContext::begin_frame`.
    pub fn frame_target(&self) -> FrameTarget {
        FrameTarget {
            view: self
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            format: self.format,
            width: self.width,
            height: self.height,
        }
    }

    /// Copies the texture back to the CPU.
    ///
    /// Returns tightly packed rows (`width * 4` bytes each), top row first.
    /// Blocks until the copy has finished.
    pub fn read_rgba8(&self, gpu: &Gpu) -> Result<Vec<u8>> {
        let texel_size = self.format.block_copy_size(None);
        anyhow::ensure!(
            texel_size == Some(4),
            "read_rgba8 needs a 4-byte colour format, target is {:?}",
            self.format
        );

        let unpadded_row = self.width * 4;
        let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen readback buffer"),
            size: u64::from(padded_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen readback encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        gpu.queue().submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        // The map callback has run once the wait returns.
        gpu.device()
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for readback")?;
        rx.recv()
            .context("readback callback dropped without a result")?
            .context("failed to map readback buffer")?;

        let mut pixels = Vec::with_capacity((unpadded_row * self.height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_row as usize]);
            }
        }
        buffer.unmap();

        Ok(pixels)
    }
}
