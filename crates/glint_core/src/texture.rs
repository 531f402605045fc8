//! Texture storage and sampling.
//!
//! Pixels are kept in linear RGBA float form so the renderer can sample
//! them without per-lookup conversion. Color images are converted from
//! sRGB on load; normal maps must be loaded with `from_file_linear`
//! since their channels encode directions, not colors.

use std::path::Path;

use glint_math::Vec3;
use thiserror::Error;

/// Errors that can occur while loading a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture: {0}")]
    Load(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A texture with linear RGBA float pixels, row-major, (0,0) at top-left.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl Texture {
    /// Create a texture from raw pixel data.
    ///
    /// Fails if the pixel count does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> TextureResult<Self> {
        if pixels.len() != (width * height) as usize {
            return Err(TextureError::Load(format!(
                "pixel count {} does not match {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a 1x1 solid color texture.
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
        }
    }

    /// Load a color texture, converting sRGB channels to linear.
    pub fn from_file(path: impl AsRef<Path>) -> TextureResult<Self> {
        Self::load(path.as_ref(), true)
    }

    /// Load a data texture (normal/roughness maps) without color
    /// conversion.
    pub fn from_file_linear(path: impl AsRef<Path>) -> TextureResult<Self> {
        Self::load(path.as_ref(), false)
    }

    fn load(path: &Path, srgb: bool) -> TextureResult<Self> {
        let img = image::open(path)
            .map_err(|e| TextureError::Load(format!("{}: {}", path.display(), e)))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<[f32; 4]> = rgba
            .pixels()
            .map(|p| {
                let decode = |v: u8| {
                    if srgb {
                        srgb_to_linear(v)
                    } else {
                        v as f32 / 255.0
                    }
                };
                [decode(p[0]), decode(p[1]), decode(p[2]), p[3] as f32 / 255.0]
            })
            .collect();

        log::debug!(
            "loaded texture {} ({}x{}, srgb={})",
            path.display(),
            width,
            height,
            srgb
        );

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Sample the texture at UV coordinates with bilinear filtering.
    ///
    /// UVs are in [0, 1] with (0, 0) at the bottom-left; coordinates
    /// outside the range wrap (repeat).
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width as f32 - 1.0);
        let y = (1.0 - v) * (self.height as f32 - 1.0); // Flip V for image rows

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let lerp = |a: [f32; 4], b: [f32; 4], t: f32| {
            Vec3::new(
                a[0] * (1.0 - t) + b[0] * t,
                a[1] * (1.0 - t) + b[1] * t,
                a[2] * (1.0 - t) + b[2] * t,
            )
        };

        let top = lerp(self.get_pixel(x0, y0), self.get_pixel(x1, y0), fx);
        let bottom = lerp(self.get_pixel(x0, y1), self.get_pixel(x1, y1), fx);
        top * (1.0 - fy) + bottom * fy
    }

    fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .copied()
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }
}

/// Convert an sRGB byte value to a linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);

        let sample = tex.sample(0.5, 0.5);
        assert!((sample.x - 1.0).abs() < 0.001);
        assert!((sample.y - 0.5).abs() < 0.001);
        assert!((sample.z - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_pixel_count_validation() {
        let result = Texture::new(2, 2, vec![[0.0; 4]; 3]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_wraps() {
        let tex = Texture::solid_color(Vec3::new(0.25, 0.5, 0.75));
        let inside = tex.sample(0.2, 0.8);
        let wrapped = tex.sample(1.2, -0.2);
        assert!((inside - wrapped).length() < 1e-6);
    }

    #[test]
    fn test_bilinear_blend() {
        // 2x1: black on the left, white on the right
        let tex = Texture::new(
            2,
            1,
            vec![[0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]],
        )
        .unwrap();

        let mid = tex.sample(0.5, 0.5);
        assert!((mid.x - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
