//! Scene graph types.
//!
//! A `Scene` is the frozen snapshot the renderer consumes: objects
//! (mesh + material + transform), lights, one active camera and an
//! environment (skybox or flat background). The editing layer mutates
//! a scene only between render passes.

use std::sync::Arc;

use glint_math::{Aabb, Mat3, Mat4, Quat, Vec3};

use crate::camera::Camera;
use crate::light::Light;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::skybox::Skybox;

/// Transform components composed into a matrix (scale, then rotate,
/// then translate).
#[derive(Clone, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Decompose a 4x4 matrix into translation, rotation, and scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Convert to a 4x4 model matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Matrix for transforming normals and tangents (inverse transpose
    /// of the upper 3x3). Falls back to the rotation alone when the
    /// scale is singular.
    pub fn normal_matrix(&self) -> Mat3 {
        let m = Mat3::from_mat4(self.to_matrix());
        if m.determinant().abs() > 1e-12 {
            m.inverse().transpose()
        } else {
            Mat3::from_quat(self.rotation)
        }
    }
}

/// A renderable object: shared mesh, optional material, transform.
#[derive(Clone, Debug)]
pub struct Object {
    pub name: String,
    pub mesh: Arc<Mesh>,
    pub material: Option<Arc<Material>>,
    pub transform: Transform,
}

impl Object {
    pub fn new(name: impl Into<String>, mesh: Arc<Mesh>) -> Self {
        Self {
            name: name.into(),
            mesh,
            material: None,
            transform: Transform::default(),
        }
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A complete scene snapshot.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub lights: Vec<Light>,
    pub camera: Option<Camera>,
    /// Flat background color (linear RGB) for rays that miss when no
    /// skybox is set
    pub background: Vec3,
    /// Environment texture; overrides `background` for miss rays
    pub skybox: Option<Skybox>,
    pub name: String,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    /// Radiance for a ray that misses all geometry.
    pub fn environment(&self, direction: Vec3) -> Vec3 {
        match &self.skybox {
            Some(sky) => sky.sample(direction),
            None => self.background,
        }
    }

    /// Total triangle count across all objects.
    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.triangle_count()).sum()
    }

    /// World-space bounding box of all objects.
    pub fn world_bounds(&self) -> Aabb {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for object in &self.objects {
            let matrix = object.transform.to_matrix();
            let b = &object.mesh.bounds;
            let corners = [
                Vec3::new(b.x.min, b.y.min, b.z.min),
                Vec3::new(b.x.max, b.y.min, b.z.min),
                Vec3::new(b.x.min, b.y.max, b.z.min),
                Vec3::new(b.x.max, b.y.max, b.z.min),
                Vec3::new(b.x.min, b.y.min, b.z.max),
                Vec3::new(b.x.max, b.y.min, b.z.max),
                Vec3::new(b.x.min, b.y.max, b.z.max),
                Vec3::new(b.x.max, b.y.max, b.z.max),
            ];

            for corner in corners {
                let world = matrix.transform_point3(corner);
                min = min.min(world);
                max = max.max(world);
            }
        }

        if min.x.is_infinite() {
            Aabb::EMPTY
        } else {
            Aabb::from_points(min, max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    #[test]
    fn test_scene_composition() {
        let mut scene = Scene::new("test");
        let mesh = Arc::new(shapes::cube(1.0));

        scene.add_object(Object::new("a", mesh.clone()));
        scene.add_object(
            Object::new("b", mesh).with_transform(Transform::from_translation(Vec3::X * 3.0)),
        );
        scene.add_light(Light::Directional {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
        });

        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.triangle_count(), 24);
        assert!(scene.camera.is_none());
    }

    #[test]
    fn test_world_bounds_covers_transformed_objects() {
        let mut scene = Scene::new("bounds");
        let mesh = Arc::new(shapes::cube(1.0));
        scene.add_object(
            Object::new("far", mesh).with_transform(Transform::from_translation(Vec3::X * 10.0)),
        );

        let bounds = scene.world_bounds();
        assert!((bounds.x.max - 10.5).abs() < 1e-4);
        assert!((bounds.x.min - 9.5).abs() < 1e-4);
    }

    #[test]
    fn test_transform_matrix_roundtrip() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };

        let matrix = transform.to_matrix();
        let recovered = Transform::from_matrix(matrix);

        assert!((recovered.translation - transform.translation).length() < 0.001);
        assert!((recovered.scale - transform.scale).length() < 0.001);
    }

    #[test]
    fn test_normal_matrix_undoes_nonuniform_scale() {
        let transform = Transform {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::new(2.0, 1.0, 1.0),
        };

        // A normal on a surface stretched along X must stay perpendicular
        let n = transform.normal_matrix() * Vec3::new(1.0, 1.0, 0.0).normalize();
        let surface_dir = Mat3::from_mat4(transform.to_matrix()) * Vec3::new(-1.0, 1.0, 0.0);
        assert!(n.dot(surface_dir).abs() < 1e-5);
    }

    #[test]
    fn test_empty_scene_bounds() {
        let scene = Scene::new("empty");
        assert_eq!(scene.world_bounds(), Aabb::EMPTY);
    }

    #[test]
    fn test_environment_prefers_skybox() {
        use crate::texture::Texture;
        use std::sync::Arc;

        let mut scene = Scene::new("env");
        scene.background = Vec3::new(0.1, 0.2, 0.3);
        assert_eq!(scene.environment(Vec3::Z), Vec3::new(0.1, 0.2, 0.3));

        scene.set_skybox(Skybox::new(Arc::new(Texture::solid_color(Vec3::ONE))));
        assert_eq!(scene.environment(Vec3::Z), Vec3::ONE);
    }
}
