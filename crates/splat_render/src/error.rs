use splat_core::{GridError, SceneError};
use thiserror::Error;

use crate::buffers::BufferId;

/// Errors from GPU setup, scene loading and diagnostics
///
/// Nothing on the per-frame encode path fails except surface acquisition and
/// a missing binding, which only happens if the arena was never populated.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No adapter matched the request
    #[error("no suitable GPU adapter found")]
    AdapterUnavailable,
    #[error("GPU device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    /// Surface was lost or outdated (window resized, minimized, etc.)
    #[error("surface lost")]
    SurfaceLost,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(String),
    /// A stage asked the arena for a buffer that was never allocated
    #[error("buffer {0:?} is not allocated")]
    MissingBuffer(BufferId),
    /// A stage was encoded before its bindings were resolved
    #[error("stage '{0}' has no bind group")]
    Unbound(&'static str),
    /// Scene does not fit the device's buffer limits
    #[error("scene of {splats} splats needs {bytes} bytes, device allows {limit}")]
    SceneTooLarge { splats: u32, bytes: u64, limit: u64 },
    #[error("{pairs} sort pairs exceed the capacity of {capacity}")]
    SortCapacity { pairs: usize, capacity: u32 },
    #[error("buffer readback failed: {0}")]
    Readback(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Grid(#[from] GridError),
}
