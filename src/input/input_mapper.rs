//! Input mapping from raw events to semantic actions
//!
//! Maps keyboard input to viewer actions like Exit, TogglePoints, etc.
//! Camera keys (arrows, Shift) are NOT mapped here - they go directly to CameraController.

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Scale multiplier change per key press
pub const SCALE_STEP: f32 = 0.05;
/// Field of view change per key press, in degrees
pub const FOV_STEP: f32 = 5.0;

/// Actions triggered by special input (not camera motion)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Exit application (Escape)
    Exit,
    /// Reset camera to starting pose (R key)
    ResetCamera,
    /// Toggle fullscreen mode (F key)
    ToggleFullscreen,
    /// Toggle drawing splat centres as points (P key)
    TogglePoints,
    /// Change the splat scale multiplier ([ and ] keys)
    AdjustScale(f32),
    /// Change the field of view in degrees (- and = keys)
    AdjustFov(f32),
    /// Log frame diagnostics (I key)
    Inspect,
    /// Regenerate the demo scene with a new seed (N key)
    ReloadScene,
}

/// Maps raw input events to semantic actions
///
/// Camera keys are NOT mapped here - they go directly to the
/// CameraController. This mapper handles "special" keys only.
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `Some(action)` for special keys, `None` for everything else
    pub fn map_keyboard(key: KeyCode, state: ElementState) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::Escape => Some(InputAction::Exit),
            KeyCode::KeyR => Some(InputAction::ResetCamera),
            KeyCode::KeyF => Some(InputAction::ToggleFullscreen),
            KeyCode::KeyP => Some(InputAction::TogglePoints),
            KeyCode::BracketLeft => Some(InputAction::AdjustScale(-SCALE_STEP)),
            KeyCode::BracketRight => Some(InputAction::AdjustScale(SCALE_STEP)),
            KeyCode::Minus => Some(InputAction::AdjustFov(-FOV_STEP)),
            KeyCode::Equal => Some(InputAction::AdjustFov(FOV_STEP)),
            KeyCode::KeyI => Some(InputAction::Inspect),
            KeyCode::KeyN => Some(InputAction::ReloadScene),
            _ => None,
        }
    }
}

/// Apply a scale step, keeping the multiplier in [0, 1]
pub fn step_scale(current: f32, delta: f32) -> f32 {
    (current + delta).clamp(0.0, 1.0)
}
