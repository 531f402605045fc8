//! World-space triangle soup flattened from a scene.
//!
//! The renderer intersects against a single flat triangle list rather
//! than walking the object hierarchy per ray. Baking happens once per
//! render pass: every object's mesh is transformed into world space,
//! normals and tangents through the inverse-transpose, and materials
//! are collected into one table indexed by the triangles.

use std::sync::Arc;

use glint_core::{Material, Scene, Vertex};
use glint_math::{Aabb, Vec3};

/// One world-space triangle with full vertex attributes.
#[derive(Clone, Debug)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    /// Index into [`TriangleSet::materials`], `None` for the default
    /// surface
    pub material: Option<u32>,
    /// Index of the source object in the scene
    pub object: u32,
}

impl Triangle {
    /// World-space bounding box of this triangle.
    pub fn bounds(&self) -> Aabb {
        let [v0, v1, v2] = &self.vertices;
        let mut aabb = Aabb::from_points(v0.position, v1.position);
        aabb.grow(v2.position);
        aabb
    }

    pub fn centroid(&self) -> Vec3 {
        let [v0, v1, v2] = &self.vertices;
        (v0.position + v1.position + v2.position) / 3.0
    }
}

/// Flat list of world-space triangles plus the material table they
/// reference. This is the geometry the BVH indexes into.
#[derive(Clone, Debug, Default)]
pub struct TriangleSet {
    pub triangles: Vec<Triangle>,
    pub materials: Vec<Arc<Material>>,
}

impl TriangleSet {
    /// Flatten a scene into world-space triangles.
    pub fn build(scene: &Scene) -> Self {
        let mut triangles = Vec::with_capacity(scene.triangle_count());
        let mut materials = Vec::new();

        for (object_index, object) in scene.objects.iter().enumerate() {
            let model = object.transform.to_matrix();
            let normal_matrix = object.transform.normal_matrix();

            let material = object.material.as_ref().map(|mat| {
                let index = materials.len() as u32;
                materials.push(Arc::clone(mat));
                index
            });

            for face in &object.mesh.faces {
                let vertices = face.map(|i| {
                    let v = &object.mesh.vertices[i as usize];
                    Vertex {
                        position: model.transform_point3(v.position),
                        normal: (normal_matrix * v.normal).normalize_or_zero(),
                        uv: v.uv,
                        tangent: (normal_matrix * v.tangent).normalize_or_zero(),
                        bitangent: (normal_matrix * v.bitangent).normalize_or_zero(),
                    }
                });
                triangles.push(Triangle {
                    vertices,
                    material,
                    object: object_index as u32,
                });
            }
        }

        log::debug!(
            "Flattened {} objects into {} triangles, {} materials",
            scene.objects.len(),
            triangles.len(),
            materials.len()
        );
        Self {
            triangles,
            materials,
        }
    }

    /// Build directly from prepared triangles (used by tests and
    /// procedural callers).
    pub fn from_triangles(triangles: Vec<Triangle>, materials: Vec<Arc<Material>>) -> Self {
        Self {
            triangles,
            materials,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Look up the material for a hit, if the triangle carries one.
    pub fn material(&self, index: Option<u32>) -> Option<&Arc<Material>> {
        index.and_then(|i| self.materials.get(i as usize))
    }
}
