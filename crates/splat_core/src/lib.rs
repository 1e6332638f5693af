//! Core types for the splatview renderer
//!
//! This crate has no GPU dependency. It provides:
//!
//! - [`SceneInput`] - Flat per-splat arrays handed over by scene producers
//! - [`GpuSplat3D`] / [`GpuSplat2D`] - Interleaved layouts shared with the WGSL stages
//! - [`TileGrid`] - Screen tile grid and the packed (tile, depth) sort key
//! - [`RenderParams`] / [`CameraMatrices`] - Per-frame inputs to the pipeline
//! - [`precompute`] - Covariance helpers for building scenes from scale/rotation

mod error;
mod gpu;
mod params;
pub mod precompute;
mod scene;
mod tile_grid;

pub use error::{GridError, SceneError};
pub use gpu::{pack_scene, GpuSplat2D, GpuSplat3D, DEPTH_CULLED};
pub use params::{CameraMatrices, RenderFlags, RenderParams};
pub use scene::SceneInput;
pub use tile_grid::{TileGrid, TileRect, KEY_BITS, MAX_TILE_BITS, RADIX_PASSES};

// Re-export the math types used in public signatures
pub use glam::{Mat4, Quat, Vec2, Vec3};
