//! Image loading and texture objects.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::context::{ContextError, TextureId};
use crate::gl::GlContext;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to read image {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{width}x{height} image with {len} bytes is not valid RGBA8 data")]
    Size { width: u32, height: u32, len: usize },

    #[error("{width}x{height} texture exceeds the device limit of {max} pixels per side")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Tightly packed RGBA8 pixels, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(TextureError::Size {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour image. Zero dimensions are raised to 1.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: rgba.repeat(width as usize * height as usize),
        }
    }

    /// Decodes an encoded image (PNG, JPEG) into RGBA8.
    pub fn decode(bytes: &[u8], flip_vertically: bool) -> Result<Self, image::ImageError> {
        let mut decoded = image::load_from_memory(bytes)?;
        if flip_vertically {
            decoded = decoded.flipv();
        }
        Ok(Self::from_image(decoded.to_rgba8()))
    }

    /// Reads and decodes an image file.
    pub fn load(path: &Path, flip_vertically: bool) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::decode(&bytes, flip_vertically).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_image(image: image::RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The mip levels below this image, halving each side (rounding down, at
    /// least 1) until 1x1.
    pub fn mip_chain(&self) -> Vec<TextureImage> {
        let mut levels = Vec::new();
        let Some(mut current) = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
        else {
            return levels;
        };

        while current.width() > 1 || current.height() > 1 {
            let width = (current.width() / 2).max(1);
            let height = (current.height() / 2).max(1);
            current = image::imageops::resize(
                &current,
                width,
                height,
                image::imageops::FilterType::Triangle,
            );
            levels.push(Self::from_image(current.clone()));
        }

        levels
    }
}

/// How an image file is turned into a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureOptions {
    /// Store the bottom row first, matching texture coordinates with `v`
    /// pointing up.
    pub flip_vertically: bool,
    pub generate_mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: false,
            generate_mipmaps: true,
        }
    }
}

/// A texture object on a [`GlContext`], deleted on drop.
pub struct Texture {
    gl: Rc<GlContext>,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn from_image(
        gl: &Rc<GlContext>,
        image: &TextureImage,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let id = gl.create_texture(image, options.generate_mipmaps)?;
        Ok(Self {
            gl: Rc::clone(gl),
            id,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Loads an image file and uploads it.
    pub fn from_path(
        gl: &Rc<GlContext>,
        path: impl AsRef<Path>,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = TextureImage::load(path, options.flip_vertically)?;
        log::debug!(
            "loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Self::from_image(gl, &image, options)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Binds this texture to `unit`.
    pub fn bind(&self, unit: u32) {
        if let Err(err) = self.gl.bind_texture_unit(unit, Some(self.id)) {
            log::error!("binding texture {}: {err}", self.id);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gl.delete_texture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(image: &image::RgbaImage) -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn rejects_mismatched_pixel_data() {
        let err = TextureImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TextureError::Size { len: 15, .. }));
        assert!(TextureImage::from_rgba(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let image = TextureImage::solid(8, 2, [10, 20, 30, 255]);
        let sizes: Vec<(u32, u32)> = image
            .mip_chain()
            .iter()
            .map(|l| (l.width(), l.height()))
            .collect();
        assert_eq!(sizes, [(4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn one_pixel_image_has_no_mips() {
        assert!(TextureImage::solid(1, 1, [0; 4]).mip_chain().is_empty());
    }

    #[test]
    fn decode_can_flip_rows() {
        let mut source = image::RgbaImage::new(1, 2);
        source.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        source.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        let png = encode_png(&source);

        let upright = TextureImage::decode(&png, false).unwrap();
        assert_eq!(&upright.pixels()[..4], &[255, 0, 0, 255]);

        let flipped = TextureImage::decode(&png, true).unwrap();
        assert_eq!(&flipped.pixels()[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = TextureImage::load(&dir.path().join("nope.png"), false).unwrap_err();
        assert!(matches!(missing, TextureError::Io { .. }));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        let err = TextureImage::load(&corrupt, false).unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
        assert!(err.to_string().contains("corrupt.png"));
    }
}
