//! Camera controller for orbit-style inspection
//!
//! Controls:
//! - Left drag: orbit around the target
//! - Shift + left drag: pan the target
//! - Mouse wheel: zoom
//! - Arrow keys: orbit at a fixed angular speed

use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Largest mouse delta accepted per event, in pixels
const MAX_MOUSE_DELTA: f64 = 50.0;

/// Camera controller for handling input
pub struct CameraController {
    // Keyboard orbit state
    orbit_left: bool,
    orbit_right: bool,
    orbit_up: bool,
    orbit_down: bool,
    shift: bool,

    // Mouse state
    mouse_pressed: bool,
    pending_dx: f32,
    pending_dy: f32,
    pending_scroll: f32,

    // Configuration
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub key_rotate_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            orbit_left: false,
            orbit_right: false,
            orbit_up: false,
            orbit_down: false,
            shift: false,

            mouse_pressed: false,
            pending_dx: 0.0,
            pending_dy: 0.0,
            pending_scroll: 0.0,

            rotate_speed: 0.005, // radians per pixel
            pan_speed: 0.002,    // target distances per pixel
            zoom_speed: 0.1,     // log-distance per wheel line
            key_rotate_speed: 1.5, // radians per second
        }
    }

    /// Process keyboard input; returns true if the key was consumed
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;

        match key {
            KeyCode::ArrowLeft => { self.orbit_left = pressed; true }
            KeyCode::ArrowRight => { self.orbit_right = pressed; true }
            KeyCode::ArrowUp => { self.orbit_up = pressed; true }
            KeyCode::ArrowDown => { self.orbit_down = pressed; true }
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                self.shift = pressed;
                false
            }
            _ => false,
        }
    }

    /// Process mouse button input
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.mouse_pressed = state == ElementState::Pressed;
        }
    }

    /// Process mouse movement; each delta is clamped to ±50 px
    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if !self.mouse_pressed {
            return;
        }
        self.pending_dx += delta_x.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA) as f32;
        self.pending_dy += delta_y.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA) as f32;
    }

    /// Process wheel input in lines; positive scrolls zoom in
    pub fn process_scroll(&mut self, lines: f32) {
        if lines.is_finite() {
            self.pending_scroll += lines;
        }
    }

    /// Apply accumulated input to the camera
    ///
    /// Returns true if the camera moved.
    pub fn update<C: CameraControl>(&mut self, camera: &mut C, dt: f32) -> bool {
        let mut changed = false;

        let key_yaw = (self.orbit_right as i32 - self.orbit_left as i32) as f32;
        let key_pitch = (self.orbit_up as i32 - self.orbit_down as i32) as f32;
        if key_yaw != 0.0 || key_pitch != 0.0 {
            camera.rotate(key_yaw * self.key_rotate_speed * dt, key_pitch * self.key_rotate_speed * dt);
            changed = true;
        }

        if self.pending_dx != 0.0 || self.pending_dy != 0.0 {
            if self.shift {
                camera.pan(self.pending_dx * self.pan_speed, self.pending_dy * self.pan_speed);
            } else {
                // Dragging right swings the eye left around the target; dragging down raises it
                camera.rotate(-self.pending_dx * self.rotate_speed, self.pending_dy * self.rotate_speed);
            }
            changed = true;
        }

        if self.pending_scroll != 0.0 {
            camera.zoom(self.pending_scroll * self.zoom_speed);
            changed = true;
        }

        // Reset pending input
        self.pending_dx = 0.0;
        self.pending_dy = 0.0;
        self.pending_scroll = 0.0;

        changed
    }

    /// Check if any orbit keys are held
    pub fn is_moving(&self) -> bool {
        self.orbit_left || self.orbit_right || self.orbit_up || self.orbit_down
    }

    /// Builder: set drag rotation speed (radians per pixel)
    pub fn with_rotate_speed(mut self, speed: f32) -> Self {
        self.rotate_speed = speed;
        self
    }

    /// Builder: set pan speed (target distances per pixel)
    pub fn with_pan_speed(mut self, speed: f32) -> Self {
        self.pan_speed = speed;
        self
    }

    /// Builder: set zoom speed per wheel line
    pub fn with_zoom_speed(mut self, speed: f32) -> Self {
        self.zoom_speed = speed;
        self
    }
}

/// Trait for camera control
/// Allows the controller to drive different camera implementations
pub trait CameraControl {
    fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32);
    fn pan(&mut self, dx: f32, dy: f32);
    fn zoom(&mut self, amount: f32);
}
