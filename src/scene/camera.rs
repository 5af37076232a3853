use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use super::transform::trs_matrix;
use super::UpdateHook;

/// Perspective camera. Projection parameters are fixed at construction; the
/// view follows the current translation and rotation on every read.
#[derive(Clone)]
pub struct Camera {
    aspect_ratio: f32,
    fov_y_degrees: f32,
    near: f32,
    far: f32,
    perspective: Mat4,
    pub translation: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    update: Option<UpdateHook<Camera>>,
}

impl Camera {
    pub fn new(aspect_ratio: f32, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            aspect_ratio,
            fov_y_degrees,
            near,
            far,
            perspective: Mat4::perspective_rh_gl(fov_y_degrees.to_radians(), aspect_ratio, near, far),
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            update: None,
        }
    }

    /// Same pose and hook with a projection built for a new aspect ratio.
    pub fn resized(&self, aspect_ratio: f32) -> Self {
        Self {
            translation: self.translation,
            rotation: self.rotation,
            update: self.update.clone(),
            ..Self::new(aspect_ratio, self.fov_y_degrees, self.near, self.far)
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn perspective(&self) -> Mat4 {
        self.perspective
    }

    /// World transform `T * R`. Cameras carry no scale.
    pub fn transform(&self) -> Mat4 {
        trs_matrix(self.translation, self.rotation, Vec3::ONE)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.transform().inverse()
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vec3::new(dx, dy, dz);
    }

    pub fn set_update(&mut self, hook: impl Fn(f64, &mut Camera) + 'static) {
        self.update = Some(Rc::new(hook));
    }

    pub fn clear_update(&mut self) {
        self.update = None;
    }

    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    pub(crate) fn run_update(&mut self, time: f64) {
        if let Some(hook) = self.update.clone() {
            hook(time, self);
        }
    }
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("aspect_ratio", &self.aspect_ratio)
            .field("fov_y_degrees", &self.fov_y_degrees)
            .field("translation", &self.translation)
            .field("rotation", &self.rotation)
            .field("has_update", &self.update.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_is_inverse_of_pose() {
        let mut cam = Camera::new(16.0 / 9.0, 60.0, 0.1, 100.0);
        cam.translation = Vec3::new(1.0, 2.0, 5.0);
        cam.rotate(10.0, 20.0, 30.0);
        let id = cam.view_matrix() * cam.transform();
        assert!(id.abs_diff_eq(Mat4::IDENTITY, 1e-4));
        // Camera position maps to view-space origin
        let p = cam.view_matrix().transform_point3(cam.translation);
        assert!(p.abs_diff_eq(Vec3::ZERO, 1e-4));
    }

    #[test]
    fn perspective_is_fixed_at_construction() {
        let mut cam = Camera::new(1.0, 90.0, 0.1, 100.0);
        let before = cam.perspective();
        cam.translation = Vec3::new(3.0, 0.0, 0.0);
        cam.rotate(0.0, 45.0, 0.0);
        assert_eq!(cam.perspective(), before);
        // 90 degree fov with square aspect: unit focal length
        assert!((before.x_axis.x - 1.0).abs() < 1e-5);
        assert!((before.y_axis.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn resized_keeps_pose() {
        let mut cam = Camera::new(1.0, 60.0, 0.1, 100.0);
        cam.translation = Vec3::new(0.0, 1.0, 4.0);
        cam.set_update(|_, c| c.rotate(1.0, 0.0, 0.0));
        let wide = cam.resized(2.0);
        assert_eq!(wide.aspect_ratio(), 2.0);
        assert_eq!(wide.translation, cam.translation);
        assert!(wide.has_update());
        assert!((wide.perspective().x_axis.x * 2.0 - cam.perspective().x_axis.x).abs() < 1e-5);
    }
}
