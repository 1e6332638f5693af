//! Splatview - real-time Gaussian splat viewer
//!
//! Application layer on top of the `splat_render` pipeline: configuration,
//! input mapping, procedural demo scenes and the window/render systems.

pub mod config;
pub mod input;
pub mod scene;
pub mod systems;
