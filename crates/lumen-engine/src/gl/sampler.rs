/// Texture coordinate wrapping outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Sampler state used for every `sampler` binding.
///
/// `min_filter` + `mipmap_filter` together express the GL minification
/// modes: `Linear` + `Linear` is `LINEAR_MIPMAP_LINEAR`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SamplerParams {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: FilterMode,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
        }
    }
}

impl SamplerParams {
    /// Same wrap mode on both axes, trilinear filtering.
    pub fn trilinear(wrap: WrapMode) -> Self {
        Self {
            wrap_u: wrap,
            wrap_v: wrap,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
        }
    }

    pub(crate) fn create_sampler(&self, device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen sampler"),
            address_mode_u: address_mode(self.wrap_u),
            address_mode_v: address_mode(self.wrap_v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(self.mag_filter),
            min_filter: filter_mode(self.min_filter),
            mipmap_filter: match self.mipmap_filter {
                FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
                FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
            },
            ..Default::default()
        })
    }
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}
