//! Tone mapping operators applied on framebuffer read-back.
//!
//! The framebuffer stores open-range linear radiance; an operator
//! compresses it into [0, 1] before the sRGB transfer. All operators
//! are pure per-pixel functions of the linear color.

use glint_math::Vec3;

/// Which curve compresses linear radiance for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneMapping {
    /// Straight clamp to [0, 1]
    Clamp,
    /// `c / (1 + c)` per channel
    Reinhard,
    /// `1 - exp(-c * exposure)`
    Exposure(f32),
    /// Narkowicz's rational fit of the ACES filmic curve
    Aces,
    /// Hable's filmic curve, normalized to a white point of 11.2
    Uncharted2,
}

impl ToneMapping {
    /// Map a linear color into [0, 1].
    pub fn apply(&self, color: Vec3) -> Vec3 {
        let mapped = match *self {
            ToneMapping::Clamp => color,
            ToneMapping::Reinhard => color / (Vec3::ONE + color),
            ToneMapping::Exposure(exposure) => Vec3::ONE - (-color * exposure).exp(),
            ToneMapping::Aces => {
                (color * (2.51 * color + Vec3::splat(0.03)))
                    / (color * (2.43 * color + Vec3::splat(0.59)) + Vec3::splat(0.14))
            }
            ToneMapping::Uncharted2 => {
                const WHITE: f32 = 11.2;
                hable(color * 2.0) / hable(Vec3::splat(WHITE))
            }
        };
        mapped.clamp(Vec3::ZERO, Vec3::ONE)
    }
}

fn hable(x: Vec3) -> Vec3 {
    const A: f32 = 0.15;
    const B: f32 = 0.50;
    const C: f32 = 0.10;
    const D: f32 = 0.20;
    const E: f32 = 0.02;
    const F: f32 = 0.30;
    (x * (A * x + Vec3::splat(C * B)) + Vec3::splat(D * E))
        / (x * (A * x + Vec3::splat(B)) + Vec3::splat(D * F))
        - Vec3::splat(E / F)
}
