//! Environment backdrop sampled by rays that miss all geometry.

use std::sync::Arc;

use glint_math::Vec3;

use crate::texture::Texture;

/// Equirectangular environment texture.
///
/// The full sphere of directions maps onto the image: U from the
/// azimuth around +Y, V from the polar angle, with straight up at the
/// top row.
#[derive(Clone, Debug)]
pub struct Skybox {
    pub texture: Arc<Texture>,
    /// Radiance multiplier applied to every sample
    pub intensity: f32,
}

impl Skybox {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            intensity: 1.0,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Radiance arriving from a world-space direction.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Vec3::ZERO;
        }

        let u = 0.5 + dir.z.atan2(dir.x) / std::f32::consts::TAU;
        // acos(y) is 0 straight up; V=1 is the texture's top row
        let v = 1.0 - dir.y.clamp(-1.0, 1.0).acos() / std::f32::consts::PI;
        self.texture.sample(u, v) * self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x2 texture: red on the top row, blue on the bottom.
    fn pole_texture() -> Arc<Texture> {
        Arc::new(
            Texture::new(
                1,
                2,
                vec![[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_poles_hit_top_and_bottom_rows() {
        let sky = Skybox::new(pole_texture());

        let up = sky.sample(Vec3::Y);
        assert!((up - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5, "up {:?}", up);

        let down = sky.sample(Vec3::NEG_Y);
        assert!(
            (down - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5,
            "down {:?}",
            down
        );

        // The horizon blends the two rows
        let side = sky.sample(Vec3::X);
        assert!((side.x - 0.5).abs() < 1e-5);
        assert!((side.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_azimuth_sweeps_across_columns() {
        // 4x1 gradient along U
        let sky = Skybox::new(Arc::new(
            Texture::new(
                4,
                1,
                vec![
                    [0.0, 0.0, 0.0, 1.0],
                    [0.25, 0.0, 0.0, 1.0],
                    [0.5, 0.0, 0.0, 1.0],
                    [0.75, 0.0, 0.0, 1.0],
                ],
            )
            .unwrap(),
        ));

        // U grows with the azimuth around +Y
        let a = sky.sample(Vec3::NEG_Z);
        let b = sky.sample(Vec3::X);
        let c = sky.sample(Vec3::Z);
        assert!(a.x < b.x && b.x < c.x, "{} {} {}", a.x, b.x, c.x);
    }

    #[test]
    fn test_intensity_scales_radiance() {
        let sky = Skybox::new(pole_texture()).with_intensity(2.0);
        let up = sky.sample(Vec3::Y);
        assert!((up.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_direction_is_black() {
        let sky = Skybox::new(pole_texture());
        assert_eq!(sky.sample(Vec3::ZERO), Vec3::ZERO);
    }
}
