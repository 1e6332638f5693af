//! GPU-compatible uniform and control types for the splat pipeline
//!
//! These types are designed to match the shader layouts in common.wgsl exactly.
//! All types derive Pod and Zeroable for safe GPU buffer operations.

use bytemuck::{Pod, Zeroable};
use splat_core::{CameraMatrices, RenderParams, TileGrid};

/// Threads per workgroup in the transform and tiling stages
pub const SPLAT_WORKGROUP: u32 = 128;
/// Threads per workgroup in the sort kernels
pub const SORT_WORKGROUP: u32 = 256;
/// Keys handled by one sort workgroup (four chunks of 256)
pub const SORT_BLOCK: u32 = 1024;
/// Digit values per radix pass
pub const RADIX_BINS: u32 = 256;
/// Byte stride between per-pass radix uniforms (dynamic offset alignment)
pub const RADIX_PASS_STRIDE: u64 = 256;

/// Camera matrices
/// Layout: 192 bytes (must match common.wgsl Camera)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
}

impl From<&CameraMatrices> for CameraUniform {
    fn from(m: &CameraMatrices) -> Self {
        Self {
            view: m.view.to_cols_array_2d(),
            projection: m.projection.to_cols_array_2d(),
            view_projection: m.view_projection.to_cols_array_2d(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::from(&CameraMatrices::default())
    }
}

/// Scene-wide constants, rewritten only on scene load
/// Layout: 32 bytes (must match common.wgsl Globals)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GlobalParams {
    pub splat_count: u32,
    pub grid_x: u32,
    pub grid_y: u32,
    pub tile_bits: u32,
    /// Capacity of the sort key/value buffers
    pub max_pairs: u32,
    pub max_per_tile: u32,
    pub tile_count: u32,
    pub _padding: u32,
}

impl GlobalParams {
    pub fn new(grid: &TileGrid, splat_count: u32, max_pairs: u32, max_per_tile: u32) -> Self {
        Self {
            splat_count,
            grid_x: grid.grid_x(),
            grid_y: grid.grid_y(),
            tile_bits: grid.tile_bits(),
            max_pairs,
            max_per_tile,
            tile_count: grid.tile_count(),
            _padding: 0,
        }
    }
}

/// Viewport size and the pixel size of one tile
/// Layout: 16 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ViewportParams {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl ViewportParams {
    pub fn new(grid: &TileGrid, width: u32, height: u32) -> Self {
        let (tile_width, tile_height) = grid.tile_size(width, height);
        Self {
            width,
            height,
            tile_width,
            tile_height,
        }
    }
}

/// Render parameters plus background
/// Layout: 32 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderUniform {
    pub background: [f32; 4],
    pub scale_multiplier: f32,
    pub flags: u32,
    pub _padding: [u32; 2],
}

impl RenderUniform {
    pub fn new(params: &RenderParams, background: [f32; 4]) -> Self {
        Self {
            background,
            scale_multiplier: params.scale_multiplier(),
            flags: params.flags().bits(),
            _padding: [0; 2],
        }
    }
}

/// Indirect dispatch arguments for the sort kernels plus the clamped key count
/// Layout: 16 bytes; the first 12 bytes are a valid `DispatchIndirectArgs`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SortDispatch {
    pub groups_x: u32,
    pub groups_y: u32,
    pub groups_z: u32,
    pub key_count: u32,
}

/// Per-pass radix parameters, one every [`RADIX_PASS_STRIDE`] bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RadixPassParams {
    pub shift: u32,
    pub _padding: [u32; 3],
}

/// Pair and overflow counters written by the tiling stage
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PairCounters {
    /// Slots handed out by tiling; may run past capacity, never wraps
    pub reserved: u32,
    /// Pairs dropped because the sort buffers were full
    pub overflow: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(size_of::<CameraUniform>(), 192);
        assert_eq!(size_of::<GlobalParams>(), 32);
        assert_eq!(size_of::<ViewportParams>(), 16);
        assert_eq!(size_of::<RenderUniform>(), 32);
        assert_eq!(size_of::<SortDispatch>(), 16);
        assert_eq!(size_of::<RadixPassParams>(), 16);
        assert_eq!(size_of::<PairCounters>(), 8);
    }

    #[test]
    fn test_sort_block_is_whole_chunks() {
        assert_eq!(SORT_BLOCK % SORT_WORKGROUP, 0);
        assert_eq!(RADIX_BINS, SORT_WORKGROUP);
    }

    #[test]
    fn test_global_params_from_grid() {
        let grid = TileGrid::new(16, 8).unwrap();
        let globals = GlobalParams::new(&grid, 10, 2048, 64);
        assert_eq!(globals.tile_count, 128);
        assert_eq!(globals.tile_bits, 7);
        assert_eq!(globals.max_pairs, 2048);
    }

    #[test]
    fn test_viewport_tile_size() {
        let grid = TileGrid::default();
        let vp = ViewportParams::new(&grid, 1920, 1080);
        assert_eq!((vp.tile_width, vp.tile_height), (60, 34));
    }

    #[test]
    fn test_render_uniform_flags() {
        let params = RenderParams::new(0.5, true);
        let u = RenderUniform::new(&params, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(u.flags, 1);
        assert_eq!(u.scale_multiplier, 0.5);
    }
}
