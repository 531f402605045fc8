//! Surface material definition.

use std::sync::Arc;

use glint_math::{Vec2, Vec3};

use crate::texture::Texture;

/// A surface material: diffuse color, Blinn-Phong specular terms and
/// optional texture maps.
///
/// The renderer shades a fixed material model rather than an open trait
/// hierarchy; the light/material kinds it understands form a closed set.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name (editor-facing)
    pub name: String,

    /// Diffuse/albedo color (linear RGB, 0-1)
    pub diffuse_color: Vec3,

    /// Emissive color (linear RGB, added unconditionally)
    pub emissive_color: Vec3,

    /// Specular reflectance factor
    pub specular: f32,

    /// Blinn-Phong shininess exponent
    pub shininess: f32,

    /// Albedo texture; multiplies `diffuse_color` when present
    pub diffuse_texture: Option<Arc<Texture>>,

    /// Tangent-space normal map
    pub normal_texture: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_color: Vec3::new(0.5, 0.5, 0.5),
            emissive_color: Vec3::ZERO,
            specular: 0.5,
            shininess: 32.0,
            diffuse_texture: None,
            normal_texture: None,
        }
    }
}

impl Material {
    /// Create a material with a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            ..Default::default()
        }
    }

    /// Attach a diffuse texture.
    pub fn with_diffuse_texture(mut self, texture: Arc<Texture>) -> Self {
        self.diffuse_texture = Some(texture);
        self
    }

    /// Attach a tangent-space normal map.
    pub fn with_normal_texture(mut self, texture: Arc<Texture>) -> Self {
        self.normal_texture = Some(texture);
        self
    }

    /// Resolve the albedo at the given UV coordinates.
    pub fn albedo(&self, uv: Vec2) -> Vec3 {
        match &self.diffuse_texture {
            Some(tex) => self.diffuse_color * tex.sample(uv.x, uv.y),
            None => self.diffuse_color,
        }
    }

    /// Sample the normal map at the given UVs, decoded from [0,1]^3 to
    /// a [-1,1]^3 tangent-space direction. `None` when the material has
    /// no normal map.
    pub fn normal_sample(&self, uv: Vec2) -> Option<Vec3> {
        let tex = self.normal_texture.as_ref()?;
        let encoded = tex.sample(uv.x, uv.y);
        Some(encoded * 2.0 - Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_albedo_without_texture() {
        let mat = Material::new("red", Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(mat.albedo(Vec2::new(0.3, 0.7)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_albedo_modulated_by_texture() {
        let tex = Arc::new(Texture::solid_color(Vec3::new(0.5, 0.5, 0.5)));
        let mat = Material::new("gray", Vec3::ONE).with_diffuse_texture(tex);
        let albedo = mat.albedo(Vec2::ZERO);
        assert!((albedo - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_normal_sample_decode() {
        // Flat normal map texel (0.5, 0.5, 1.0) decodes to +Z
        let tex = Arc::new(Texture::solid_color(Vec3::new(0.5, 0.5, 1.0)));
        let mat = Material::default().with_normal_texture(tex);
        let n = mat.normal_sample(Vec2::ZERO).unwrap();
        assert!((n - Vec3::Z).length() < 0.01);
    }

    #[test]
    fn test_normal_sample_absent() {
        let mat = Material::default();
        assert!(mat.normal_sample(Vec2::ZERO).is_none());
    }
}
