//! Render target storage.
//!
//! Pixels live in linear space as `f32` channels. During a pass every
//! worker accumulates into its own `ThreadBuffer`; the framebuffer
//! becomes the additive merge of those buffers once the workers have
//! joined, so no pixel is ever written concurrently.

use glint_math::{Vec3, Vec4};

use crate::renderer::RenderError;
use crate::tonemap::ToneMapping;

/// Channel counts the framebuffer knows how to store.
const SUPPORTED_CHANNELS: [u32; 3] = [1, 3, 4];

/// Linear-space image the renderer writes into.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<f32>,
}

impl Framebuffer {
    /// Allocate a zeroed framebuffer. Supported channel counts are 1
    /// (grayscale), 3 (RGB) and 4 (RGBA).
    pub fn new(width: u32, height: u32, channels: u32) -> Result<Self, RenderError> {
        if !SUPPORTED_CHANNELS.contains(&channels) {
            return Err(RenderError::UnsupportedChannelCount(channels));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyFramebuffer);
        }

        Ok(Self {
            width,
            height,
            channels,
            data: vec![0.0; (width * height * channels) as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Raw linear-space channel data, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Reset every channel to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Read back a pixel as RGB, or `None` outside the image. Grayscale
    /// buffers splat their single channel; the alpha channel of RGBA
    /// buffers is dropped.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = ((y * self.width + x) * self.channels) as usize;
        Some(match self.channels {
            1 => Vec3::splat(self.data[base]),
            _ => Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2]),
        })
    }

    /// One zeroed accumulation buffer per worker.
    pub fn create_thread_buffers(&self, count: usize) -> Vec<ThreadBuffer> {
        (0..count)
            .map(|_| ThreadBuffer {
                width: self.width,
                height: self.height,
                channels: self.channels,
                data: vec![0.0; self.data.len()],
            })
            .collect()
    }

    /// Fold worker buffers into the framebuffer by addition.
    ///
    /// Samples for one pixel may be spread across buffers; summing in
    /// buffer order keeps the result independent of how chunks were
    /// scheduled.
    pub fn merge_thread_buffers(&mut self, buffers: &[ThreadBuffer]) {
        for buffer in buffers {
            debug_assert_eq!(buffer.data.len(), self.data.len());
            for (dst, src) in self.data.iter_mut().zip(&buffer.data) {
                *dst += src;
            }
        }
    }

    /// Copy of the buffer converted to sRGB. The stored data stays
    /// linear; conversion is read-only.
    pub fn to_srgb(&self) -> Vec<f32> {
        let mut out = self.data.clone();
        if self.channels == 4 {
            // Alpha stays linear
            for chunk in out.chunks_exact_mut(4) {
                for v in &mut chunk[..3] {
                    *v = linear_to_srgb(*v);
                }
            }
        } else {
            for v in &mut out {
                *v = linear_to_srgb(*v);
            }
        }
        out
    }

    /// Convert to 8-bit RGBA for display or PNG output, clamping
    /// out-of-range radiance.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.to_rgba8_with(ToneMapping::Clamp)
    }

    /// Convert to 8-bit RGBA through a tone mapping operator, then the
    /// sRGB transfer. The stored data stays linear.
    pub fn to_rgba8_with(&self, tone: ToneMapping) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.width * self.height * 4) as usize);
        for i in 0..(self.width * self.height) as usize {
            let base = i * self.channels as usize;
            let (rgb, a) = match self.channels {
                1 => (Vec3::splat(self.data[base]), 1.0),
                3 => (
                    Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2]),
                    1.0,
                ),
                _ => (
                    Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2]),
                    self.data[base + 3],
                ),
            };
            let mapped = tone.apply(rgb);
            out.push(quantize(linear_to_srgb(mapped.x)));
            out.push(quantize(linear_to_srgb(mapped.y)));
            out.push(quantize(linear_to_srgb(mapped.z)));
            out.push(quantize(a));
        }
        out
    }
}

/// Per-worker accumulation target. Owned by exactly one worker for the
/// duration of a pass, then merged.
#[derive(Clone, Debug)]
pub struct ThreadBuffer {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<f32>,
}

impl ThreadBuffer {
    /// Add a weighted sample to a pixel. `color` is linear RGBA; the
    /// channels actually stored depend on the buffer format. Coordinates
    /// outside the image are logged and dropped.
    pub fn accumulate(&mut self, x: u32, y: u32, color: Vec4, weight: f32) {
        if x >= self.width || y >= self.height {
            log::warn!(
                "Sample at ({}, {}) outside {}x{} buffer",
                x,
                y,
                self.width,
                self.height
            );
            return;
        }

        let base = ((y * self.width + x) * self.channels) as usize;
        match self.channels {
            1 => self.data[base] += luminance(color.truncate()) * weight,
            3 => {
                self.data[base] += color.x * weight;
                self.data[base + 1] += color.y * weight;
                self.data[base + 2] += color.z * weight;
            }
            _ => {
                self.data[base] += color.x * weight;
                self.data[base + 1] += color.y * weight;
                self.data[base + 2] += color.z * weight;
                self.data[base + 3] += color.w * weight;
            }
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

/// Rec. 601 luma weights for grayscale output.
fn luminance(color: Vec3) -> f32 {
    color.dot(Vec3::new(0.299, 0.587, 0.114))
}

/// Linear to sRGB transfer function, clamped to [0, 1].
pub fn linear_to_srgb(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}
