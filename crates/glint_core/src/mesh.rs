//! Mesh geometry for the glint scene graph.
//!
//! A mesh is an ordered list of vertices (position, normal, UV, tangent
//! basis) plus faces indexing into them. Meshes are owned by the scene
//! and read-only during rendering.

use glint_math::{Aabb, Vec2, Vec3};

/// A single mesh vertex with the full attribute set the renderer
/// interpolates at hit points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Tangent-space basis for normal mapping. Zero until
    /// [`Mesh::compute_tangents`] runs (or the loader supplies them).
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    /// Create a vertex with an empty tangent basis.
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
        }
    }
}

/// Triangle mesh with indexed faces.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Vertex attributes (one entry per vertex)
    pub vertices: Vec<Vertex>,

    /// Faces as index triples into `vertices`
    pub faces: Vec<[u32; 3]>,

    /// Object-space bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh from vertices and faces; computes bounds eagerly.
    ///
    /// Faces referencing out-of-range vertices are dropped with a warning
    /// rather than poisoning every later intersection query.
    pub fn new(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        let vertex_count = vertices.len() as u32;
        let mut valid = Vec::with_capacity(faces.len());
        for face in faces {
            if face.iter().any(|&i| i >= vertex_count) {
                log::warn!(
                    "Dropping face {:?}: vertex count is {}",
                    face,
                    vertex_count
                );
                continue;
            }
            valid.push(face);
        }

        let bounds = Self::compute_bounds(&vertices);
        Self {
            vertices,
            faces: valid,
            bounds,
        }
    }

    /// Raw min/max over the positions; the box is built once at the end
    /// so the thin-slab padding applies only to genuinely flat axes.
    fn compute_bounds(vertices: &[Vertex]) -> Aabb {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in vertices {
            min = min.min(v.position);
            max = max.max(v.position);
        }

        if min.x.is_infinite() {
            Aabb::EMPTY
        } else {
            Aabb::from_points(min, max)
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Compute per-vertex tangent/bitangent vectors from UV gradients.
    ///
    /// Face tangents are accumulated at each shared vertex and
    /// normalized, matching how smooth normals are averaged. Faces with a
    /// degenerate UV area contribute an arbitrary basis orthogonal to the
    /// face normal, so a mesh without meaningful UVs still gets a usable
    /// frame for normal mapping.
    pub fn compute_tangents(&mut self) {
        let mut tangents = vec![Vec3::ZERO; self.vertices.len()];
        let mut bitangents = vec![Vec3::ZERO; self.vertices.len()];

        for face in &self.faces {
            let [i0, i1, i2] = face.map(|i| i as usize);
            let v0 = &self.vertices[i0];
            let v1 = &self.vertices[i1];
            let v2 = &self.vertices[i2];

            let edge1 = v1.position - v0.position;
            let edge2 = v2.position - v0.position;
            let duv1 = v1.uv - v0.uv;
            let duv2 = v2.uv - v0.uv;

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            let (tangent, bitangent) = if det.abs() > 1e-12 {
                let r = 1.0 / det;
                (
                    (edge1 * duv2.y - edge2 * duv1.y) * r,
                    (edge2 * duv1.x - edge1 * duv2.x) * r,
                )
            } else {
                // No UV area: fall back to any frame orthogonal to the face
                let normal = edge1.cross(edge2);
                let tangent = normal.cross(Vec3::Y);
                let tangent = if tangent.length_squared() < 1e-12 {
                    normal.cross(Vec3::X)
                } else {
                    tangent
                };
                (tangent, normal.cross(tangent))
            };

            for &i in &[i0, i1, i2] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            // Gram-Schmidt against the vertex normal keeps the basis orthogonal
            let n = vertex.normal;
            let t = tangents[i] - n * n.dot(tangents[i]);
            if t.length_squared() > 1e-12 {
                vertex.tangent = t.normalize();
            } else {
                vertex.tangent = n.any_orthonormal_vector();
            }
            let b = n.cross(vertex.tangent);
            // Preserve handedness from the accumulated bitangent
            vertex.bitangent = if b.dot(bitangents[i]) < 0.0 { -b } else { b };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> Mesh {
        // Unit quad in the XY plane, facing +Z, UVs covering [0,1]^2
        let vertices = vec![
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(1.0, 1.0, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
        ];
        Mesh::new(vertices, vec![[0, 1, 2], [0, 2, 3]])
    }

    #[test]
    fn test_mesh_counts_and_bounds() {
        let mesh = quad_mesh();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        // Non-degenerate axes are exact, not inflated by slab padding
        assert_eq!(mesh.bounds.x.min, 0.0);
        assert_eq!(mesh.bounds.x.max, 1.0);
        assert_eq!(mesh.bounds.y.min, 0.0);
        assert_eq!(mesh.bounds.y.max, 1.0);
        // The flat Z axis keeps its minimum hittable thickness
        assert!(mesh.bounds.z.size() > 0.0);
    }

    #[test]
    fn test_out_of_range_faces_dropped() {
        let vertices = vec![
            Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
            Vertex::new(Vec3::X, Vec3::Z, Vec2::X),
            Vertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
        ];
        let mesh = Mesh::new(vertices, vec![[0, 1, 2], [0, 1, 9]]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_compute_tangents_follows_uv_axes() {
        let mut mesh = quad_mesh();
        mesh.compute_tangents();

        for v in &mesh.vertices {
            // U grows with +X, V with +Y, so tangent ~ +X, bitangent ~ +Y
            assert!((v.tangent - Vec3::X).length() < 1e-4, "tangent {:?}", v.tangent);
            assert!(
                (v.bitangent - Vec3::Y).length() < 1e-4,
                "bitangent {:?}",
                v.bitangent
            );
            // Basis stays orthonormal
            assert!(v.tangent.dot(v.normal).abs() < 1e-4);
            assert!((v.tangent.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tangents_without_uv_area() {
        let vertices = vec![
            Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
            Vertex::new(Vec3::X, Vec3::Z, Vec2::ZERO),
            Vertex::new(Vec3::Y, Vec3::Z, Vec2::ZERO),
        ];
        let mut mesh = Mesh::new(vertices, vec![[0, 1, 2]]);
        mesh.compute_tangents();

        for v in &mesh.vertices {
            assert!((v.tangent.length() - 1.0).abs() < 1e-4);
            assert!(v.tangent.dot(v.normal).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new(Vec::new(), Vec::new());
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.bounds, Aabb::EMPTY);
    }
}
