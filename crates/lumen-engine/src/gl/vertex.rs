use crate::context::VertexArrayId;

/// One attribute inside an interleaved vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    /// `@location(n)` of the vertex-stage input it feeds.
    pub location: u32,
    pub format: wgpu::VertexFormat,
    /// Byte offset from the start of a vertex.
    pub offset: u64,
}

impl VertexAttribute {
    /// Scalar kind the shader sees. Normalized and float formats read as
    /// floats.
    pub fn scalar_kind(&self) -> naga::ScalarKind {
        use wgpu::VertexFormat as F;

        match self.format {
            F::Uint8
            | F::Uint8x2
            | F::Uint8x4
            | F::Uint16
            | F::Uint16x2
            | F::Uint16x4
            | F::Uint32
            | F::Uint32x2
            | F::Uint32x3
            | F::Uint32x4 => naga::ScalarKind::Uint,
            F::Sint8
            | F::Sint8x2
            | F::Sint8x4
            | F::Sint16
            | F::Sint16x2
            | F::Sint16x4
            | F::Sint32
            | F::Sint32x2
            | F::Sint32x3
            | F::Sint32x4 => naga::ScalarKind::Sint,
            _ => naga::ScalarKind::Float,
        }
    }
}

/// Byte layout of one interleaved vertex buffer.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(stride: u64, attributes: Vec<VertexAttribute>) -> Self {
        Self { stride, attributes }
    }

    /// Tightly packed `f32` attributes, each given as `(location, components)`.
    ///
    /// `VertexLayout::packed_f32(&[(0, 3), (1, 2)])` is a position + uv layout
    /// with a 20-byte stride.
    pub fn packed_f32(parts: &[(u32, u8)]) -> Self {
        let mut offset = 0u64;
        let mut attributes = Vec::with_capacity(parts.len());

        for &(location, components) in parts {
            let format = match components {
                1 => wgpu::VertexFormat::Float32,
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                _ => wgpu::VertexFormat::Float32x4,
            };
            attributes.push(VertexAttribute {
                location,
                format,
                offset,
            });
            offset += format.size();
        }

        Self {
            stride: offset,
            attributes,
        }
    }

    pub fn has_location(&self, location: u32) -> bool {
        self.attribute(location).is_some()
    }

    pub fn attribute(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    /// Number of whole vertices in a buffer of `len` bytes.
    pub fn vertex_count(&self, len: usize) -> u32 {
        if self.stride == 0 {
            return 0;
        }
        u32::try_from(len as u64 / self.stride).unwrap_or(u32::MAX)
    }

    pub(crate) fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format,
                offset: a.offset,
                shader_location: a.location,
            })
            .collect()
    }
}

pub(crate) struct VertexArray {
    pub buffer: wgpu::Buffer,
    pub layout: VertexLayout,
    pub vertex_count: u32,
}

impl VertexArray {
    pub fn label(id: VertexArrayId) -> String {
        format!("lumen vertex array {id}")
    }
}
