//! Gaussian splat rendering library
//!
//! This crate provides the wgpu-based tile sort-and-composite pipeline.
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`buffers::BufferLifecycle`] - Buffer arena sized by the loaded scene
//! - [`schedule::PassSchedule`] - Ordered compute steps with barriers on hazards
//! - [`pipeline`] - Clear, transform, tiling, tile offsets, radix sort and composite stages
//! - [`renderer::SplatRenderer`] - Ties the stages together per frame
//!
//! ## Frame
//!
//! Each frame runs, in submission order: clear counters, project splats,
//! bin them into tiles, prefix-sum the tile counts, radix sort the
//! (tile, depth) keys, then composite every pixel front to back.

pub mod buffers;
pub mod context;
pub mod diagnostics;
mod error;
pub mod pipeline;
mod readback;
pub mod renderer;
pub mod schedule;
mod settings;

pub use buffers::{BufferId, BufferLifecycle, BufferTable, SceneLayout};
pub use context::{GpuContext, RenderContext};
pub use diagnostics::{FrameCheckError, FrameReadback, FrameStats};
pub use error::RenderError;
pub use pipeline::{RadixSort, SortStrategy};
pub use readback::read_buffer;
pub use renderer::SplatRenderer;
pub use settings::RendererSettings;

// Re-export core types used in the public API
pub use splat_core::{CameraMatrices, GpuSplat2D, RenderParams, SceneInput, TileGrid};
