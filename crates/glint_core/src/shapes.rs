//! Procedural mesh builders.
//!
//! Cube, plane and UV sphere generators used by tests, demos and the
//! editing layer's default objects. Every builder produces meshes with
//! normals, UVs and a tangent basis.

use glint_math::{Vec2, Vec3};

use crate::mesh::{Mesh, Vertex};

/// Build an axis-aligned cube centered at the origin.
///
/// 24 vertices (4 per face) so each face keeps a flat normal and its own
/// UV island.
pub fn cube(size: f32) -> Mesh {
    let h = size * 0.5;

    // (normal, face-right, face-up) per face
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(12);

    for (face_index, (normal, right, up)) in faces.iter().enumerate() {
        let base = (face_index * 4) as u32;
        let center = *normal * h;
        let corners = [
            (center - *right * h - *up * h, Vec2::new(0.0, 0.0)),
            (center + *right * h - *up * h, Vec2::new(1.0, 0.0)),
            (center + *right * h + *up * h, Vec2::new(1.0, 1.0)),
            (center - *right * h + *up * h, Vec2::new(0.0, 1.0)),
        ];
        for (position, uv) in corners {
            vertices.push(Vertex::new(position, *normal, uv));
        }
        indices.push([base, base + 1, base + 2]);
        indices.push([base, base + 2, base + 3]);
    }

    let mut mesh = Mesh::new(vertices, indices);
    mesh.compute_tangents();
    mesh
}

/// Build a square plane in the XZ plane facing +Y, centered at the origin.
pub fn plane(size: f32) -> Mesh {
    let h = size * 0.5;
    let vertices = vec![
        Vertex::new(Vec3::new(-h, 0.0, h), Vec3::Y, Vec2::new(0.0, 0.0)),
        Vertex::new(Vec3::new(h, 0.0, h), Vec3::Y, Vec2::new(1.0, 0.0)),
        Vertex::new(Vec3::new(h, 0.0, -h), Vec3::Y, Vec2::new(1.0, 1.0)),
        Vertex::new(Vec3::new(-h, 0.0, -h), Vec3::Y, Vec2::new(0.0, 1.0)),
    ];
    let mut mesh = Mesh::new(vertices, vec![[0, 1, 2], [0, 2, 3]]);
    mesh.compute_tangents();
    mesh
}

/// Build a UV sphere centered at the origin.
///
/// `rings` counts latitude bands (>= 2), `segments` longitude slices
/// (>= 3); values below the minimums are clamped.
pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> Mesh {
    let rings = rings.max(2);
    let segments = segments.max(3);

    let mut vertices = Vec::new();
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * std::f32::consts::PI;
        let (sin_t, cos_t) = theta.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let phi = u * std::f32::consts::TAU;
            let (sin_p, cos_p) = phi.sin_cos();

            let normal = Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p);
            vertices.push(Vertex::new(
                normal * radius,
                normal,
                Vec2::new(u, 1.0 - v),
            ));
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::new();
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            // Pole rings produce one degenerate triangle each; keep the
            // quad split uniform and let the intersector reject them.
            indices.push([a, b, a + 1]);
            indices.push([a + 1, b, b + 1]);
        }
    }

    let mut mesh = Mesh::new(vertices, indices);
    mesh.compute_tangents();
    mesh
}
