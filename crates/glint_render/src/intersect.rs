//! Ray/triangle intersection and hit attribute resolution.
//!
//! The primitive test returns only a distance and barycentric weights;
//! the full attribute set (point, shading frame, UVs) is resolved once
//! per ray, for the nearest hit, instead of at every candidate triangle.

use glint_math::{Ray, Vec2, Vec3};

use crate::triangles::Triangle;

/// Determinant and barycentric tolerance for the triangle test.
pub const INTERSECT_EPSILON: f32 = 1e-6;

/// Moller-Trumbore ray/triangle test.
///
/// Returns the parametric distance and the barycentric weights
/// `(w, u, v)` of the hit, where `w = 1 - u - v` weights the first
/// vertex. Backfaces are reported like front faces; degenerate
/// triangles (near-zero determinant) never hit.
pub fn ray_triangle(ray: &Ray, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<(f32, Vec3)> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;

    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < INTERSECT_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin - p0;
    let u = tvec.dot(pvec) * inv_det;
    if !(-INTERSECT_EPSILON..=1.0 + INTERSECT_EPSILON).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < -INTERSECT_EPSILON || u + v > 1.0 + INTERSECT_EPSILON {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t <= INTERSECT_EPSILON {
        return None;
    }

    Some((t, Vec3::new(1.0 - u - v, u, v)))
}

/// Everything shading needs to know about the nearest intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHitInfo {
    /// Parametric distance along the (normalized) ray
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Interpolated, normalized shading normal
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    /// Interpolated texture coordinates
    pub uv: Vec2,
    /// Index into the triangle set's material table
    pub material: Option<u32>,
    /// Index of the scene object the triangle came from
    pub object: u32,
}

/// Interpolate vertex attributes at barycentric weights `(w, u, v)`.
pub fn hit_info_from_barycentric(
    ray: &Ray,
    triangle: &Triangle,
    distance: f32,
    bary: Vec3,
) -> RayHitInfo {
    let [v0, v1, v2] = &triangle.vertices;

    let normal = v0.normal * bary.x + v1.normal * bary.y + v2.normal * bary.z;
    let tangent = v0.tangent * bary.x + v1.tangent * bary.y + v2.tangent * bary.z;
    let bitangent = v0.bitangent * bary.x + v1.bitangent * bary.y + v2.bitangent * bary.z;
    let uv = v0.uv * bary.x + v1.uv * bary.y + v2.uv * bary.z;

    RayHitInfo {
        distance,
        point: ray.at(distance),
        normal: normal.normalize_or_zero(),
        tangent: tangent.normalize_or_zero(),
        bitangent: bitangent.normalize_or_zero(),
        uv,
        material: triangle.material,
        object: triangle.object,
    }
}

/// Replace the hit normal with a tangent-space sample rotated into
/// world space through the interpolated TBN frame.
///
/// `sample` is the decoded map value in [-1,1]^3 (+Z meaning "along the
/// geometric normal"). A degenerate frame or a near-zero sample leaves
/// the interpolated normal untouched.
pub fn perturb_normal(hit: &mut RayHitInfo, sample: Vec3) {
    if hit.tangent.length_squared() < 1e-8 || hit.bitangent.length_squared() < 1e-8 {
        return;
    }

    let world = hit.tangent * sample.x + hit.bitangent * sample.y + hit.normal * sample.z;
    if world.length_squared() > 1e-8 {
        hit.normal = world.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Vertex;

    fn unit_triangle() -> (Vec3, Vec3, Vec3) {
        (
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_hit_through_interior() {
        let (p0, p1, p2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -3.0), Vec3::Z);

        let (t, bary) = ray_triangle(&ray, p0, p1, p2).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
        assert!((bary.x - 0.5).abs() < 1e-5);
        assert!((bary.y - 0.25).abs() < 1e-5);
        assert!((bary.z - 0.25).abs() < 1e-5);
        assert!((bary.x + bary.y + bary.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_outside_edges() {
        let (p0, p1, p2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.75, 0.75, -3.0), Vec3::Z);
        assert!(ray_triangle(&ray, p0, p1, p2).is_none());

        let ray = Ray::new(Vec3::new(-0.25, 0.25, -3.0), Vec3::Z);
        assert!(ray_triangle(&ray, p0, p1, p2).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let (p0, p1, p2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::X);
        assert!(ray_triangle(&ray, p0, p1, p2).is_none());
    }

    #[test]
    fn test_backface_hits() {
        let (p0, p1, p2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 3.0), Vec3::NEG_Z);
        let (t, _) = ray_triangle(&ray, p0, p1, p2).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        // All three vertices collinear
        let p0 = Vec3::ZERO;
        let p1 = Vec3::X;
        let p2 = Vec3::X * 2.0;
        let ray = Ray::new(Vec3::new(0.5, 0.0, -1.0), Vec3::Z);
        assert!(ray_triangle(&ray, p0, p1, p2).is_none());
    }

    #[test]
    fn test_behind_origin_misses() {
        let (p0, p1, p2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(ray_triangle(&ray, p0, p1, p2).is_none());
    }

    fn attribute_triangle() -> Triangle {
        let mut v0 = Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::new(0.0, 0.0));
        let mut v1 = Vertex::new(Vec3::X, Vec3::Z, Vec2::new(1.0, 0.0));
        let mut v2 = Vertex::new(Vec3::Y, Vec3::Z, Vec2::new(0.0, 1.0));
        for v in [&mut v0, &mut v1, &mut v2] {
            v.tangent = Vec3::X;
            v.bitangent = Vec3::Y;
        }
        Triangle {
            vertices: [v0, v1, v2],
            material: None,
            object: 0,
        }
    }

    #[test]
    fn test_barycentric_attribute_interpolation() {
        let triangle = attribute_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -2.0), Vec3::Z);
        let (t, bary) = ray_triangle(
            &ray,
            triangle.vertices[0].position,
            triangle.vertices[1].position,
            triangle.vertices[2].position,
        )
        .unwrap();

        let hit = hit_info_from_barycentric(&ray, &triangle, t, bary);
        assert!((hit.point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-5);
        assert!((hit.uv - Vec2::new(0.25, 0.25)).length() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_perturb_normal_identity_sample() {
        let triangle = attribute_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -2.0), Vec3::Z);
        let (t, bary) = ray_triangle(
            &ray,
            triangle.vertices[0].position,
            triangle.vertices[1].position,
            triangle.vertices[2].position,
        )
        .unwrap();
        let mut hit = hit_info_from_barycentric(&ray, &triangle, t, bary);

        // A flat map sample (+Z) keeps the interpolated normal
        perturb_normal(&mut hit, Vec3::Z);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);

        // A tilted sample leans the normal toward the tangent
        perturb_normal(&mut hit, Vec3::new(1.0, 0.0, 1.0));
        assert!(hit.normal.x > 0.5);
        assert!((hit.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_perturb_normal_degenerate_frame() {
        let mut triangle = attribute_triangle();
        for v in &mut triangle.vertices {
            v.tangent = Vec3::ZERO;
            v.bitangent = Vec3::ZERO;
        }
        let ray = Ray::new(Vec3::new(0.25, 0.25, -2.0), Vec3::Z);
        let (t, bary) = ray_triangle(
            &ray,
            triangle.vertices[0].position,
            triangle.vertices[1].position,
            triangle.vertices[2].position,
        )
        .unwrap();
        let mut hit = hit_info_from_barycentric(&ray, &triangle, t, bary);

        perturb_normal(&mut hit, Vec3::new(0.5, 0.5, 0.7));
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }
}
