//! Camera ray generation.
//!
//! The emitter precomputes the viewport corner and spans once per pass,
//! then maps normalized image coordinates to primary rays. With a
//! nonzero lens radius, ray origins are jittered on the aperture disk
//! and converge at the focus plane, producing depth of field.

use glint_core::Camera;
use glint_math::{Mat3, Ray, Vec2, Vec3};
use rand::RngCore;

use crate::gen_f32;

/// Everything the emitter needs from the camera plus the image shape.
#[derive(Clone, Copy, Debug)]
pub struct RayEmitterParameters {
    pub camera_position: Vec3,
    /// Camera-to-world rotation; the camera looks down local -Z
    pub camera_rotation: Mat3,
    pub sensor_width: f32,
    pub focal_length: f32,
    pub focus_distance: f32,
    pub lens_radius: f32,
    /// Image width over height
    pub aspect_ratio: f32,
}

impl RayEmitterParameters {
    pub fn from_camera(camera: &Camera, image_width: u32, image_height: u32) -> Self {
        Self {
            camera_position: camera.position,
            camera_rotation: camera.rotation,
            sensor_width: camera.sensor_width,
            focal_length: camera.focal_length,
            focus_distance: camera.focus_distance,
            lens_radius: camera.lens_radius,
            aspect_ratio: image_width as f32 / image_height as f32,
        }
    }
}

/// Maps normalized image coordinates to world-space primary rays.
#[derive(Clone, Copy, Debug)]
pub struct CameraRayEmitter {
    params: RayEmitterParameters,
    /// World-space position of the viewport's top-left corner, on the
    /// focus plane
    top_left: Vec3,
    /// Top-left to top-right span
    horizontal: Vec3,
    /// Top-left to bottom-left span
    vertical: Vec3,
}

impl CameraRayEmitter {
    /// Precompute the viewport frame for a parameter block.
    pub fn new(params: RayEmitterParameters) -> Self {
        let half_width = params.sensor_width * 0.5;
        let half_height = half_width / params.aspect_ratio;

        let top_left = Self::corner(&params, -half_width, half_height);
        let top_right = Self::corner(&params, half_width, half_height);
        let bottom_left = Self::corner(&params, -half_width, -half_height);

        Self {
            params,
            top_left,
            horizontal: top_right - top_left,
            vertical: bottom_left - top_left,
        }
    }

    /// Project a sensor-plane point out to the focus plane, in world
    /// space. `x`/`y` are sensor offsets from the optical axis.
    fn corner(params: &RayEmitterParameters, x: f32, y: f32) -> Vec3 {
        let sensor_point = Vec3::new(x, y, -params.focal_length);
        let scale = params.focus_distance / params.focal_length;
        params.camera_rotation * (sensor_point * scale) + params.camera_position
    }

    /// The world-space point on the focus plane for normalized image
    /// coordinates. `(0, 0)` is the top-left corner, `(1, 1)` the
    /// bottom-right; `(0.5, 0.5)` lies on the optical axis.
    pub fn focus_point(&self, u: f32, v: f32) -> Vec3 {
        self.top_left + self.horizontal * u + self.vertical * v
    }

    /// Emit the primary ray for normalized image coordinates.
    ///
    /// With a zero lens radius the origin is the camera position and no
    /// random numbers are drawn, so rendering is deterministic.
    pub fn emit(&self, u: f32, v: f32, rng: &mut dyn RngCore) -> Ray {
        let origin = if self.params.lens_radius > 0.0 {
            let disk = sample_unit_disk(rng) * self.params.lens_radius;
            // The aperture lies in the sensor plane
            self.params.camera_position
                + self.params.camera_rotation * Vec3::new(disk.x, disk.y, 0.0)
        } else {
            self.params.camera_position
        };

        Ray::between(origin, self.focus_point(u, v))
    }
}

/// Rejection-sample a point inside the unit disk.
fn sample_unit_disk(rng: &mut dyn RngCore) -> Vec2 {
    loop {
        let p = Vec2::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
