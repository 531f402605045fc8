//! Renders a small test scene to render.png.
//!
//! Run with: cargo run --release --example render_cube

use std::sync::Arc;

use anyhow::Result;
use glint_core::{shapes, Camera, Light, Material, Object, Scene, Transform};
use glint_math::{Quat, Vec3};
use glint_render::{RenderSettings, Renderer, ToneMapping};

fn build_scene() -> Scene {
    let mut scene = Scene::new("cube demo");
    scene.background = Vec3::new(0.05, 0.07, 0.12);

    let red = Arc::new(Material::new("red", Vec3::new(0.85, 0.2, 0.15)));
    let gray = Arc::new(Material::new("gray", Vec3::splat(0.6)));

    let mut cube = Object::new("cube", Arc::new(shapes::cube(1.2))).with_material(red);
    cube.transform.rotation = Quat::from_rotation_y(0.6) * Quat::from_rotation_x(0.3);
    scene.add_object(cube);

    scene.add_object(
        Object::new("floor", Arc::new(shapes::plane(12.0)))
            .with_material(gray.clone())
            .with_transform(Transform::from_translation(Vec3::new(0.0, -1.2, 0.0))),
    );

    scene.add_object(
        Object::new("ball", Arc::new(shapes::uv_sphere(0.5, 24, 48)))
            .with_material(gray)
            .with_transform(Transform::from_translation(Vec3::new(1.8, -0.7, -0.5))),
    );

    scene.add_light(Light::Directional {
        direction: Vec3::new(-0.6, -1.0, -0.4),
        color: Vec3::new(1.0, 0.96, 0.9),
        intensity: 1.4,
    });
    scene.add_light(Light::Point {
        position: Vec3::new(-3.0, 2.0, 2.0),
        color: Vec3::new(0.4, 0.5, 1.0),
        intensity: 8.0,
    });

    scene.set_camera(
        Camera::look_at(Vec3::new(2.5, 1.5, 4.0), Vec3::new(0.3, -0.3, 0.0), Vec3::Y)
            .with_lens(50.0, 4.5, 0.04),
    );

    scene
}

fn main() -> Result<()> {
    env_logger::init();

    let scene = build_scene();
    let renderer = Renderer::new(RenderSettings {
        width: 960,
        height: 540,
        samples_per_pixel: 16,
        ..RenderSettings::default()
    })?;
    let mut framebuffer = renderer.create_framebuffer()?;

    log::info!(
        "Rendering {}x{} with {} samples per pixel on {} threads",
        renderer.settings().width,
        renderer.settings().height,
        renderer.settings().samples_per_pixel,
        renderer.settings().thread_count
    );
    renderer.render_pass(&scene, &mut framebuffer)?;

    let image = image::RgbaImage::from_raw(
        framebuffer.width(),
        framebuffer.height(),
        framebuffer.to_rgba8_with(ToneMapping::Aces),
    )
    .ok_or_else(|| anyhow::anyhow!("framebuffer size mismatch"))?;
    image.save("render.png")?;
    log::info!("Saved render.png");

    Ok(())
}
