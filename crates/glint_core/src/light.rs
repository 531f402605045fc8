//! Scene lights.
//!
//! The renderer consumes a closed set of light kinds and switches on
//! them directly, instead of an open virtual hierarchy.

use glint_math::Vec3;

/// The incident light arriving at a shaded point from one light.
#[derive(Clone, Copy, Debug)]
pub struct LightSample {
    /// Unit direction from the point toward the light
    pub direction: Vec3,
    /// Distance to the light (infinite for directional lights); used as
    /// the shadow-ray range
    pub distance: f32,
    /// Radiance after falloff, zero when the point is outside the
    /// light's influence
    pub radiance: Vec3,
}

/// A scene light.
#[derive(Clone, Debug)]
pub enum Light {
    Directional {
        /// Direction the light travels (normalized on construction by
        /// the editing layer)
        direction: Vec3,
        color: Vec3,
        intensity: f32,
    },
    Point {
        position: Vec3,
        color: Vec3,
        intensity: f32,
    },
    Spot {
        position: Vec3,
        /// Direction the cone points
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        /// Full intensity inside this angle (radians from axis)
        inner_angle: f32,
        /// Zero intensity outside this angle
        outer_angle: f32,
    },
}

impl Light {
    /// Evaluate this light at a world-space point.
    pub fn sample(&self, point: Vec3) -> LightSample {
        match self {
            Light::Directional {
                direction,
                color,
                intensity,
            } => LightSample {
                direction: -direction.normalize(),
                distance: f32::INFINITY,
                radiance: *color * *intensity,
            },

            Light::Point {
                position,
                color,
                intensity,
            } => {
                let to_light = *position - point;
                let distance_sq = to_light.length_squared().max(1e-8);
                let distance = distance_sq.sqrt();
                LightSample {
                    direction: to_light / distance,
                    distance,
                    radiance: *color * (*intensity / distance_sq),
                }
            }

            Light::Spot {
                position,
                direction,
                color,
                intensity,
                inner_angle,
                outer_angle,
            } => {
                let to_light = *position - point;
                let distance_sq = to_light.length_squared().max(1e-8);
                let distance = distance_sq.sqrt();
                let dir = to_light / distance;

                // Smooth falloff between the inner and outer cone
                let cos_angle = (-dir).dot(direction.normalize());
                let cos_inner = inner_angle.cos();
                let cos_outer = outer_angle.cos();
                let attenuation = if cos_angle >= cos_inner {
                    1.0
                } else if cos_angle <= cos_outer {
                    0.0
                } else {
                    (cos_angle - cos_outer) / (cos_inner - cos_outer)
                };

                LightSample {
                    direction: dir,
                    distance,
                    radiance: *color * (*intensity * attenuation / distance_sq),
                }
            }
        }
    }
}
