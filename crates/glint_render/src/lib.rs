//! glint_render: multithreaded CPU ray tracing engine.
//!
//! The engine renders a [`glint_core::Scene`] into a [`Framebuffer`]
//! in passes. A pass flattens the scene into world-space triangles,
//! builds a BVH over them, and hands image chunks to a pool of worker
//! threads. Rays come from a thin-lens camera model; shading is direct
//! lighting with shadow rays, normal mapping and Blinn-Phong specular.
//!
//! ```no_run
//! use std::sync::Arc;
//! use glint_core::{shapes, Camera, Light, Object, Scene};
//! use glint_math::Vec3;
//! use glint_render::{Renderer, RenderSettings};
//!
//! # fn main() -> Result<(), glint_render::RenderError> {
//! let mut scene = Scene::new("demo");
//! scene.add_object(Object::new("cube", Arc::new(shapes::cube(1.0))));
//! scene.add_light(Light::Directional {
//!     direction: Vec3::new(-1.0, -1.0, -1.0),
//!     color: Vec3::ONE,
//!     intensity: 1.0,
//! });
//! scene.set_camera(Camera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y));
//!
//! let renderer = Renderer::new(RenderSettings::default())?;
//! let mut framebuffer = renderer.create_framebuffer()?;
//! renderer.render_pass(&scene, &mut framebuffer)?;
//! # Ok(())
//! # }
//! ```

pub mod bvh;
pub mod chunk;
pub mod emitter;
pub mod framebuffer;
pub mod intersect;
pub mod renderer;
pub mod shading;
pub mod stats;
pub mod tonemap;
pub mod triangles;

pub use bvh::{Bvh, TraversalStats, TriangleHit};
pub use chunk::{generate_chunks, nearest_square_sample_count, Chunk};
pub use emitter::{CameraRayEmitter, RayEmitterParameters};
pub use framebuffer::{Framebuffer, ThreadBuffer};
pub use intersect::RayHitInfo;
pub use renderer::{
    RenderError, RenderOutcome, RenderSettings, RenderState, Renderer, DEFAULT_CHUNK_SIZE,
};
pub use stats::{RenderProgress, RenderStats};
pub use tonemap::ToneMapping;
pub use triangles::{Triangle, TriangleSet};

use rand::RngCore;

/// Uniform f32 in [0, 1) from the high bits of one RNG draw.
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gen_f32_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let v = gen_f32(&mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
