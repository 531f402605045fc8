//! Scene camera state.
//!
//! The camera is plain data owned by the scene; the renderer's
//! `CameraRayEmitter` turns it into per-pixel rays. The physical model
//! matches a thin-lens camera: sensor width + focal length define the
//! field of view, focus distance places the plane of sharpness, and a
//! nonzero lens radius produces depth of field.

use glint_math::{Mat3, Vec3};

/// Camera position, orientation and lens parameters.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation from camera space to world space; the camera looks down
    /// its local -Z axis
    pub rotation: Mat3,
    /// Sensor width in scene units (36.0 matches full-frame film)
    pub sensor_width: f32,
    pub focal_length: f32,
    pub focus_distance: f32,
    /// Aperture radius; zero disables depth of field
    pub lens_radius: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
            sensor_width: 36.0,
            focal_length: 50.0,
            focus_distance: 5.0,
            lens_radius: 0.0,
        }
    }
}

impl Camera {
    /// Create a camera at a position with default lens settings.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a camera looking from `eye` toward `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        // Camera space: X right, Y up, -Z forward
        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let true_up = right.cross(forward);
        Self {
            position: eye,
            rotation: Mat3::from_cols(right, true_up, -forward),
            ..Default::default()
        }
    }

    /// Set lens parameters.
    pub fn with_lens(mut self, focal_length: f32, focus_distance: f32, lens_radius: f32) -> Self {
        self.focal_length = focal_length;
        self.focus_distance = focus_distance;
        self.lens_radius = lens_radius;
        self
    }

    /// Set sensor width.
    pub fn with_sensor_width(mut self, sensor_width: f32) -> Self {
        self.sensor_width = sensor_width;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = Camera::default();
        let forward = camera.rotation * Vec3::NEG_Z;
        assert_eq!(forward, Vec3::NEG_Z);
    }

    #[test]
    fn test_look_at_forward() {
        let camera = Camera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let forward = camera.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);

        // Basis stays orthonormal
        let right = camera.rotation * Vec3::X;
        let up = camera.rotation * Vec3::Y;
        assert!(right.dot(up).abs() < 1e-6);
        assert!((right.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_sideways() {
        let camera = Camera::look_at(Vec3::ZERO, Vec3::new(-3.0, 0.0, 0.0), Vec3::Y);
        let forward = camera.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_X).length() < 1e-6);
    }
}
