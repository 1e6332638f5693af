//! Input handling module
//!
//! Provides input mapping from raw events to semantic actions.

mod input_mapper;

pub use input_mapper::{step_scale, InputAction, InputMapper, FOV_STEP, SCALE_STEP};
