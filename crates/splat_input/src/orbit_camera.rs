//! Orbit camera around a target point
//!
//! The camera sits on a sphere around `target`, parameterized by yaw, pitch
//! and distance. At yaw = pitch = 0 it sits on +Z looking down -Z, which is
//! the convention the splat pipeline expects.

use glam::{Mat4, Vec3};
use splat_core::CameraMatrices;

use crate::camera_controller::CameraControl;

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_FOV: f32 = 10.0;
const MAX_FOV: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrbitState {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    fov_degrees: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    state: OrbitState,
    home: OrbitState,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    min_distance: f32,
    max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 3.0)
    }
}

impl OrbitCamera {
    /// Camera `distance` units in front of `target` (+Z side)
    pub fn new(target: Vec3, distance: f32) -> Self {
        let state = OrbitState {
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance: distance.clamp(0.1, 50.0),
            fov_degrees: 60.0,
        };
        Self {
            state,
            home: state,
            near: 0.01,
            far: 50.0,
            aspect: 1.0,
            min_distance: 0.1,
            max_distance: 50.0,
        }
    }

    /// Builder: set field of view in degrees (also becomes the reset value)
    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.set_fov_degrees(degrees);
        self.home.fov_degrees = self.state.fov_degrees;
        self
    }

    /// Builder: set near and far planes
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Builder: set the allowed orbit distance range
    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(f32::EPSILON);
        self.max_distance = max.max(self.min_distance);
        self.state.distance = self.state.distance.clamp(self.min_distance, self.max_distance);
        self.home.distance = self.state.distance;
        self
    }

    pub fn target(&self) -> Vec3 {
        self.state.target
    }

    pub fn distance(&self) -> f32 {
        self.state.distance
    }

    pub fn pitch(&self) -> f32 {
        self.state.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.state.yaw
    }

    pub fn fov_degrees(&self) -> f32 {
        self.state.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Eye position on the orbit sphere
    pub fn position(&self) -> Vec3 {
        self.state.target + self.offset_direction() * self.state.distance
    }

    /// Unit vector from target to eye
    fn offset_direction(&self) -> Vec3 {
        let (sy, cy) = self.state.yaw.sin_cos();
        let (sp, cp) = self.state.pitch.sin_cos();
        Vec3::new(cp * sy, sp, cp * cy)
    }

    /// Orbit by yaw/pitch deltas in radians
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.state.yaw = (self.state.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.state.pitch = (self.state.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move the target in the view plane, scaled by distance
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = -self.offset_direction();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        self.state.target += (right * -dx + up * dy) * self.state.distance;
    }

    /// Move along the view direction; positive amounts move closer
    pub fn zoom(&mut self, amount: f32) {
        let distance = self.state.distance * (-amount).exp();
        self.state.distance = distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.state.fov_degrees = degrees.clamp(MIN_FOV, MAX_FOV);
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Return to the pose the camera was built with
    pub fn reset(&mut self) {
        self.state = self.home;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.state.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.state.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices::new(self.view_matrix(), self.projection_matrix())
    }
}

impl CameraControl for OrbitCamera {
    fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        OrbitCamera::rotate(self, delta_yaw, delta_pitch);
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        OrbitCamera::pan(self, dx, dy);
    }

    fn zoom(&mut self, amount: f32) {
        OrbitCamera::zoom(self, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = OrbitCamera::new(Vec3::ZERO, 3.0);
        assert!((camera.position() - Vec3::new(0.0, 0.0, 3.0)).length() < EPSILON);

        // Target lands in front of the camera at depth = distance
        let view_target = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((view_target - Vec3::new(0.0, 0.0, -3.0)).length() < EPSILON);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.0, 10.0);
        assert!((camera.pitch() - PITCH_LIMIT).abs() < EPSILON);
        camera.rotate(0.0, -20.0);
        assert!((camera.pitch() + PITCH_LIMIT).abs() < EPSILON);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn test_zoom_clamped() {
        let mut camera = OrbitCamera::new(Vec3::ZERO, 2.0);
        camera.zoom(100.0);
        assert!((camera.distance() - 0.1).abs() < EPSILON);
        camera.zoom(-100.0);
        assert!((camera.distance() - 50.0).abs() < EPSILON);
    }

    #[test]
    fn test_zoom_in_moves_closer() {
        let mut camera = OrbitCamera::new(Vec3::ZERO, 4.0);
        camera.zoom(0.5);
        assert!(camera.distance() < 4.0);
    }

    #[test]
    fn test_fov_clamped() {
        let mut camera = OrbitCamera::default();
        camera.set_fov_degrees(5.0);
        assert_eq!(camera.fov_degrees(), 10.0);
        camera.set_fov_degrees(120.0);
        assert_eq!(camera.fov_degrees(), 80.0);
    }

    #[test]
    fn test_pan_moves_target_sideways() {
        let mut camera = OrbitCamera::new(Vec3::ZERO, 1.0);
        camera.pan(0.5, 0.0);
        // Camera faces -Z, so right is +X; dragging right moves the target left
        assert!((camera.target() - Vec3::new(-0.5, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_reset_restores_pose() {
        let mut camera = OrbitCamera::new(Vec3::ONE, 5.0).with_fov(45.0);
        camera.rotate(1.0, 0.3);
        camera.pan(0.2, 0.2);
        camera.zoom(0.4);
        camera.set_fov_degrees(70.0);
        camera.reset();
        assert_eq!(camera.target(), Vec3::ONE);
        assert_eq!(camera.distance(), 5.0);
        assert_eq!(camera.fov_degrees(), 45.0);
        assert_eq!(camera.yaw(), 0.0);
    }

    #[test]
    fn test_matrices_product() {
        let mut camera = OrbitCamera::default();
        camera.set_aspect(16.0 / 9.0);
        camera.rotate(0.4, 0.2);
        let m = camera.matrices();
        assert!(m.view_projection.abs_diff_eq(m.projection * m.view, EPSILON));
    }

    #[test]
    fn test_invalid_aspect_ignored() {
        let mut camera = OrbitCamera::default();
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect(), 1.0);
    }
}
