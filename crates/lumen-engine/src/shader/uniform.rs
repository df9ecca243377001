use glam::{Mat4, Vec4};

use super::UniformKind;

/// A value that can be written into a program uniform.
///
/// `Int` doubles as the texture-unit selector for texture uniforms, the same
/// way sampler uniforms take a unit index in GL.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Mat4(Mat4),
    Vec4(Vec4),
}

impl UniformValue {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Mat4(_) => "mat4",
            UniformValue::Vec4(_) => "vec4",
        }
    }

    /// Zero value a freshly linked uniform of `kind` starts with.
    ///
    /// Texture uniforms start on unit 0. Samplers and unsupported kinds hold
    /// no settable value.
    pub(crate) fn initial(kind: UniformKind) -> Option<Self> {
        match kind {
            UniformKind::Int | UniformKind::Texture => Some(UniformValue::Int(0)),
            UniformKind::Float => Some(UniformValue::Float(0.0)),
            UniformKind::Vec4 => Some(UniformValue::Vec4(Vec4::ZERO)),
            UniformKind::Mat4 => Some(UniformValue::Mat4(Mat4::ZERO)),
            UniformKind::Sampler | UniformKind::Other { .. } => None,
        }
    }

    /// Whether a slot of `kind` accepts this value.
    pub(crate) fn fits(&self, kind: UniformKind) -> bool {
        match (kind, self) {
            (UniformKind::Int, UniformValue::Int(_)) => true,
            (UniformKind::Texture, UniformValue::Int(unit)) => *unit >= 0,
            (UniformKind::Float, UniformValue::Float(_)) => true,
            (UniformKind::Vec4, UniformValue::Vec4(_)) => true,
            (UniformKind::Mat4, UniformValue::Mat4(_)) => true,
            _ => false,
        }
    }

    /// Host bytes in the uniform address-space layout.
    ///
    /// glam matrices are column-major, matching WGSL `mat4x4<f32>`.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Int(v) => bytemuck::bytes_of(v),
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(m) => bytemuck::bytes_of(m),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
        }
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}

impl From<&Mat4> for UniformValue {
    fn from(value: &Mat4) -> Self {
        UniformValue::Mat4(*value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_slots_take_non_negative_units() {
        assert!(UniformValue::Int(1).fits(UniformKind::Texture));
        assert!(!UniformValue::Int(-1).fits(UniformKind::Texture));
        assert!(!UniformValue::Float(1.0).fits(UniformKind::Texture));
    }

    #[test]
    fn samplers_accept_nothing() {
        assert!(!UniformValue::Int(0).fits(UniformKind::Sampler));
        assert!(!UniformValue::Int(0).fits(UniformKind::Other { size: 12 }));
    }

    #[test]
    fn byte_sizes_match_wgsl_types() {
        assert_eq!(UniformValue::Int(7).as_bytes().len(), 4);
        assert_eq!(UniformValue::Float(0.5).as_bytes().len(), 4);
        assert_eq!(UniformValue::Vec4(Vec4::ONE).as_bytes().len(), 16);
        assert_eq!(UniformValue::Mat4(Mat4::IDENTITY).as_bytes().len(), 64);
    }

    #[test]
    fn matrix_bytes_are_column_major() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let value = UniformValue::Mat4(m);
        let floats: &[f32] = bytemuck::cast_slice(value.as_bytes());
        // Translation lives in the fourth column.
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);
    }
}
