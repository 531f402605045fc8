//! Glint core - scene snapshot types for the CPU ray tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Vertex`, `Mesh`, and procedural mesh builders
//! - **Surfacing**: `Texture`, `Material` (diffuse + tangent-space normal maps)
//! - **Scene graph**: `Object`, `Transform`, `Scene`, `Camera`, `Light`
//!
//! The `Scene` handed to the renderer is treated as a frozen snapshot:
//! the editing layer stages changes and applies them between render
//! passes, never during one.

pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod shapes;
pub mod skybox;
pub mod texture;

// Re-export commonly used types
pub use camera::Camera;
pub use light::{Light, LightSample};
pub use material::Material;
pub use mesh::{Mesh, Vertex};
pub use scene::{Object, Scene, Transform};
pub use skybox::Skybox;
pub use texture::{Texture, TextureError};
