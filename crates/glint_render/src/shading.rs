//! Direct lighting at a hit point.
//!
//! Lambert diffuse plus Blinn-Phong specular, summed over every scene
//! light with a shadow ray per light. Shadow rays use the BVH's
//! any-hit query since only occlusion matters, not which triangle
//! occludes.

use glint_core::{Light, Material};
use glint_math::{Ray, Vec3};

use crate::bvh::Bvh;
use crate::intersect::RayHitInfo;
use crate::triangles::TriangleSet;

/// Offset applied along the normal when spawning shadow rays, so the
/// shadow ray cannot re-hit the surface it leaves.
pub const SHADOW_BIAS: f32 = 1e-3;

/// Ambient fill factor applied to the albedo.
const AMBIENT: f32 = 0.03;

/// Surface used when a triangle carries no material.
fn default_material() -> Material {
    Material::new("default", Vec3::splat(0.7))
}

/// Compute the direct-lit color at a hit point. `view_dir` points from
/// the surface toward the camera.
pub fn shade(
    hit: &RayHitInfo,
    view_dir: Vec3,
    set: &TriangleSet,
    bvh: &Bvh,
    lights: &[Light],
) -> Vec3 {
    let fallback;
    let material = match set.material(hit.material) {
        Some(mat) => mat.as_ref(),
        None => {
            fallback = default_material();
            &fallback
        }
    };

    let albedo = material.albedo(hit.uv);
    let mut color = material.emissive_color + albedo * AMBIENT;

    let shadow_origin = hit.point + hit.normal * SHADOW_BIAS;
    for light in lights {
        let sample = light.sample(hit.point);
        let n_dot_l = hit.normal.dot(sample.direction);
        if n_dot_l <= 0.0 || sample.radiance == Vec3::ZERO {
            continue;
        }

        let shadow_ray = Ray::new(shadow_origin, sample.direction);
        if bvh.intersect_any(&shadow_ray, set, sample.distance - SHADOW_BIAS) {
            continue;
        }

        color += albedo * sample.radiance * n_dot_l;

        if material.specular > 0.0 {
            let half = (sample.direction + view_dir).normalize_or_zero();
            let n_dot_h = hit.normal.dot(half).max(0.0);
            color += sample.radiance * (material.specular * n_dot_h.powf(material.shininess));
        }
    }

    color
}

/// Replace non-finite color components with the background. Returns
/// whether a replacement happened so the caller can count it.
pub fn sanitize(color: Vec3, background: Vec3) -> (Vec3, bool) {
    if color.is_finite() {
        (color, false)
    } else {
        (background, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::Bvh;
    use crate::intersect;
    use crate::triangles::TriangleSet;
    use glint_core::{shapes, Object, Scene};
    use glint_math::Vec2;
    use std::sync::Arc;

    fn plane_scene(material: Option<Arc<Material>>) -> (TriangleSet, Bvh) {
        let mut scene = Scene::new("shade");
        let mut object = Object::new("floor", Arc::new(shapes::plane(10.0)));
        if let Some(mat) = material {
            object = object.with_material(mat);
        }
        scene.add_object(object);
        let set = TriangleSet::build(&scene);
        let bvh = Bvh::build(&set);
        (set, bvh)
    }

    fn hit_on_plane(set: &TriangleSet, bvh: &Bvh) -> RayHitInfo {
        let ray = Ray::new(Vec3::new(0.1, 5.0, 0.1), Vec3::NEG_Y);
        let hit = bvh.intersect_nearest(&ray, set, f32::INFINITY).unwrap();
        intersect::hit_info_from_barycentric(
            &ray,
            &set.triangles[hit.triangle as usize],
            hit.distance,
            hit.barycentric,
        )
    }

    #[test]
    fn test_unlit_surface_is_ambient_only() {
        let (set, bvh) = plane_scene(None);
        let hit = hit_on_plane(&set, &bvh);

        let color = shade(&hit, Vec3::Y, &set, &bvh, &[]);
        assert!(color.x > 0.0 && color.x < 0.1);
    }

    #[test]
    fn test_light_facing_surface_brightens() {
        let (set, bvh) = plane_scene(Some(Arc::new(Material::new("white", Vec3::ONE))));
        let hit = hit_on_plane(&set, &bvh);

        let overhead = Light::Directional {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
        };
        let lit = shade(&hit, Vec3::Y, &set, &bvh, &[overhead]);
        let unlit = shade(&hit, Vec3::Y, &set, &bvh, &[]);
        assert!(lit.x > unlit.x + 0.5);
    }

    #[test]
    fn test_light_behind_surface_contributes_nothing() {
        let (set, bvh) = plane_scene(None);
        let hit = hit_on_plane(&set, &bvh);

        let below = Light::Directional {
            direction: Vec3::Y,
            color: Vec3::ONE,
            intensity: 1.0,
        };
        let lit = shade(&hit, Vec3::Y, &set, &bvh, &[below]);
        let unlit = shade(&hit, Vec3::Y, &set, &bvh, &[]);
        assert!((lit - unlit).length() < 1e-6);
    }

    #[test]
    fn test_occluder_casts_shadow() {
        // Floor plus a cube between the light and the shaded point. The
        // blocker sits above the query ray's start so the nearest hit is
        // still the floor.
        let mut scene = Scene::new("shadow");
        scene.add_object(Object::new("floor", Arc::new(shapes::plane(10.0))));
        let mut blocker = Object::new("blocker", Arc::new(shapes::cube(1.0)));
        blocker.transform.translation = Vec3::new(0.0, 6.0, 0.0);
        scene.add_object(blocker);

        let set = TriangleSet::build(&scene);
        let bvh = Bvh::build(&set);
        let hit = hit_on_plane(&set, &bvh);

        let overhead = Light::Point {
            position: Vec3::new(0.0, 8.0, 0.0),
            color: Vec3::ONE,
            intensity: 64.0,
        };
        let shadowed = shade(&hit, Vec3::Y, &set, &bvh, &[overhead.clone()]);
        let open = {
            let (set, bvh) = plane_scene(None);
            let hit = hit_on_plane(&set, &bvh);
            shade(&hit, Vec3::Y, &set, &bvh, &[overhead])
        };
        assert!(shadowed.x < open.x);
    }

    #[test]
    fn test_emissive_adds_unconditionally() {
        let mut mat = Material::new("glow", Vec3::ZERO);
        mat.emissive_color = Vec3::new(0.0, 2.0, 0.0);
        let (set, bvh) = plane_scene(Some(Arc::new(mat)));
        let hit = hit_on_plane(&set, &bvh);

        let color = shade(&hit, Vec3::Y, &set, &bvh, &[]);
        assert!((color.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let background = Vec3::new(0.1, 0.2, 0.3);
        let (clean, flagged) = sanitize(Vec3::ONE, background);
        assert_eq!(clean, Vec3::ONE);
        assert!(!flagged);

        let (replaced, flagged) = sanitize(Vec3::new(f32::NAN, 0.0, 0.0), background);
        assert_eq!(replaced, background);
        assert!(flagged);

        let (replaced, flagged) = sanitize(Vec3::new(0.0, f32::INFINITY, 0.0), background);
        assert_eq!(replaced, background);
        assert!(flagged);
    }

    #[test]
    fn test_uv_drives_textured_albedo() {
        let tex = Arc::new(glint_core::Texture::solid_color(Vec3::new(1.0, 0.0, 0.0)));
        // Specular off so the white highlight cannot mask the red albedo
        let mut mat = Material::new("tex", Vec3::ONE).with_diffuse_texture(tex);
        mat.specular = 0.0;
        let mat = Arc::new(mat);
        let (set, bvh) = plane_scene(Some(mat));
        let mut hit = hit_on_plane(&set, &bvh);
        hit.uv = Vec2::new(0.5, 0.5);

        let overhead = Light::Directional {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
        };
        let color = shade(&hit, Vec3::Y, &set, &bvh, &[overhead]);
        assert!(color.x > 0.5);
        assert!(color.y < color.x * 0.2);
    }
}
