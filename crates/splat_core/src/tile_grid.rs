//! Screen tile grid and packed sort keys
//!
//! The grid has fixed dimensions and stretches over the viewport, so the pixel
//! size of a tile follows the window. Every (splat, tile) overlap becomes one
//! 32-bit key: tile id in the high bits, quantized depth in the low bits. A
//! single ascending sort then orders by tile first and by depth within a tile.
//!
//! The functions here mirror `tile.wgsl` and `composite.wgsl` and are used by
//! frame diagnostics to check what the GPU produced.

use glam::Vec2;

use crate::error::GridError;

/// Width of a packed sort key
pub const KEY_BITS: u32 = 32;
/// 8-bit digits per key, i.e. radix sort passes per frame
pub const RADIX_PASSES: u32 = KEY_BITS / 8;
/// Upper bound on tile id bits (4096 tiles), leaving 20 bits of depth
pub const MAX_TILE_BITS: u32 = 12;

/// Fixed tile grid covering the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    grid_x: u32,
    grid_y: u32,
}

/// Inclusive rectangle of tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRect {
    /// Number of tiles covered
    pub fn count(&self) -> u32 {
        (self.max_x - self.min_x + 1) * (self.max_y - self.min_y + 1)
    }

    /// Tile coordinates in row-major order, matching the GPU enumeration
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| (self.min_x..=self.max_x).map(move |x| (x, y)))
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self { grid_x: 32, grid_y: 32 }
    }
}

impl TileGrid {
    /// Create a grid; both axes must be powers of two
    pub fn new(grid_x: u32, grid_y: u32) -> Result<Self, GridError> {
        if !grid_x.is_power_of_two() || !grid_y.is_power_of_two() {
            return Err(GridError::NotPowerOfTwo(grid_x, grid_y));
        }
        let bits = (grid_x * grid_y).trailing_zeros();
        if bits > MAX_TILE_BITS {
            return Err(GridError::TooManyTiles {
                grid_x,
                grid_y,
                bits,
                max: MAX_TILE_BITS,
            });
        }
        Ok(Self { grid_x, grid_y })
    }

    pub fn grid_x(&self) -> u32 {
        self.grid_x
    }

    pub fn grid_y(&self) -> u32 {
        self.grid_y
    }

    pub fn tile_count(&self) -> u32 {
        self.grid_x * self.grid_y
    }

    /// Bits needed for a tile id
    pub fn tile_bits(&self) -> u32 {
        self.tile_count().trailing_zeros()
    }

    /// Bits left for quantized depth
    pub fn depth_bits(&self) -> u32 {
        KEY_BITS - self.tile_bits()
    }

    /// Pixel size of one tile for the given viewport
    pub fn tile_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.div_ceil(self.grid_x).max(1),
            height.div_ceil(self.grid_y).max(1),
        )
    }

    pub fn tile_index(&self, x: u32, y: u32) -> u32 {
        y * self.grid_x + x
    }

    /// Pack a tile id and a positive view depth into one key
    ///
    /// Positive IEEE floats order the same as their bit patterns, so shifting
    /// away the low bits is a monotone quantization.
    pub fn pack_key(&self, tile: u32, depth: f32) -> u32 {
        let depth_part = depth.to_bits() >> self.tile_bits();
        tile.checked_shl(self.depth_bits()).unwrap_or(0) | depth_part
    }

    /// Tile id stored in a key
    pub fn key_tile(&self, key: u32) -> u32 {
        key.checked_shr(self.depth_bits()).unwrap_or(0)
    }

    /// Tiles overlapped by a box centred at `screen` with half-size `extent`
    pub fn tile_range(&self, screen: Vec2, extent: Vec2, tile_size: (u32, u32)) -> TileRect {
        let size = Vec2::new(tile_size.0 as f32, tile_size.1 as f32);
        let max = Vec2::new((self.grid_x - 1) as f32, (self.grid_y - 1) as f32);
        let lo = ((screen - extent) / size).floor().clamp(Vec2::ZERO, max);
        let hi = ((screen + extent) / size).floor().clamp(Vec2::ZERO, max);
        TileRect {
            min_x: lo.x as u32,
            min_y: lo.y as u32,
            max_x: hi.x as u32,
            max_y: hi.y as u32,
        }
    }

    /// Tile containing pixel (x, y)
    pub fn tile_at_pixel(&self, x: u32, y: u32, tile_size: (u32, u32)) -> u32 {
        let tx = (x / tile_size.0).min(self.grid_x - 1);
        let ty = (y / tile_size.1).min(self.grid_y - 1);
        self.tile_index(tx, ty)
    }
}
