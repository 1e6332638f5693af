//! Camera input handling
//!
//! This crate provides an orbit camera for inspecting splat scenes and a
//! controller that turns mouse and keyboard input into camera motion.

mod camera_controller;
mod orbit_camera;

pub use camera_controller::{CameraControl, CameraController};
pub use orbit_camera::OrbitCamera;
