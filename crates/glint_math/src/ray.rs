use crate::Vec3;

/// A ray in 3D space with an origin and a direction.
///
/// Rays are immutable value types. The direction is not forced to unit
/// length by `new`; callers that need parametric distances to be metric
/// (the renderer does) should construct rays via `between` or pass a
/// normalized direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray from an origin toward a target point, with a
    /// normalized direction.
    pub fn between(origin: Vec3, target: Vec3) -> Self {
        Self {
            origin,
            direction: (target - origin).normalize(),
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_between_normalizes() {
        let ray = Ray::between(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_ray_copy() {
        let ray1 = Ray::new(Vec3::ZERO, Vec3::Y);
        let ray2 = ray1; // Copy, not move

        assert_eq!(ray1.origin, ray2.origin);
        assert_eq!(ray1.at(1.0), ray2.at(1.0));
    }
}
