//! Frame readback and consistency checks
//!
//! [`FrameReadback`] is a CPU copy of the intermediate buffers of one frame.
//! [`FrameReadback::validate`] checks the relationships the composite stage
//! relies on: offsets are the prefix sum of counts, every tile's key range
//! belongs to that tile, ids inside a tile are ordered nearest first, and
//! every pair points at a visible splat that really overlaps the tile.

use splat_core::{GpuSplat2D, TileGrid, Vec2};
use thiserror::Error;

use crate::pipeline::prefix_sum::exclusive_scan;
use crate::pipeline::types::PairCounters;

/// Pair counts from one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// (splat, tile) overlaps found by tiling, including dropped ones
    pub enumerated_pairs: u32,
    /// Pairs that made it into the sort
    pub sorted_pairs: u32,
    /// Pairs dropped because the sort buffers were full
    pub dropped_pairs: u32,
}

impl FrameStats {
    /// Every enumerated pair is either stored (a reserved slot below
    /// capacity) or counted as overflow, never both
    pub fn from_counters(counters: PairCounters, capacity: u32) -> Self {
        let sorted_pairs = counters.reserved.min(capacity);
        Self {
            enumerated_pairs: sorted_pairs.saturating_add(counters.overflow),
            sorted_pairs,
            dropped_pairs: counters.overflow,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FrameCheckError {
    #[error("buffer lengths do not match the tile grid")]
    Shape,
    #[error("tile {tile}: offset {actual}, expected {expected}")]
    Offset { tile: u32, expected: u32, actual: u32 },
    #[error("tile counts sum to {counted} but {sorted} pairs were sorted")]
    Conservation { counted: u64, sorted: u32 },
    #[error("{enumerated} pairs enumerated, {sorted} sorted and {dropped} dropped")]
    Overflow { enumerated: u32, sorted: u32, dropped: u32 },
    #[error("keys out of order at index {index}")]
    Unsorted { index: usize },
    #[error("key at index {index} belongs to tile {key_tile}, stored under tile {tile}")]
    TileMismatch { index: usize, tile: u32, key_tile: u32 },
    #[error("pair {index} references splat {id}, which is out of range or culled")]
    BadSplat { index: usize, id: u32 },
    #[error("pair {index}: key {key:#010x} does not match splat {id} (expected {expected:#010x})")]
    KeyMismatch { index: usize, id: u32, key: u32, expected: u32 },
    #[error("splat {id} does not overlap tile {tile}")]
    NoOverlap { id: u32, tile: u32 },
    #[error("tile {tile}: depth decreases at index {index}")]
    DepthOrder { tile: u32, index: usize },
}

/// CPU copy of one frame's tiling and sort output
#[derive(Debug, Clone)]
pub struct FrameReadback {
    pub grid: TileGrid,
    /// Pixel size of one tile
    pub tile_size: (u32, u32),
    pub tile_counts: Vec<u32>,
    pub tile_offsets: Vec<u32>,
    /// Sorted keys, `stats.sorted_pairs` long
    pub keys: Vec<u32>,
    /// Splat ids permuted with `keys`
    pub ids: Vec<u32>,
    pub projected: Vec<GpuSplat2D>,
    pub stats: FrameStats,
}

impl FrameReadback {
    /// Splat ids composited for `tile`, nearest first
    pub fn tile_slice(&self, tile: u32) -> &[u32] {
        let t = tile as usize;
        match (self.tile_offsets.get(t), self.tile_counts.get(t)) {
            (Some(&start), Some(&count)) => {
                let start = (start as usize).min(self.ids.len());
                let end = (start + count as usize).min(self.ids.len());
                &self.ids[start..end]
            }
            _ => &[],
        }
    }

    pub fn validate(&self) -> Result<(), FrameCheckError> {
        let stats = self.stats;
        if stats.sorted_pairs > stats.enumerated_pairs
            || stats.dropped_pairs != stats.enumerated_pairs - stats.sorted_pairs
        {
            return Err(FrameCheckError::Overflow {
                enumerated: stats.enumerated_pairs,
                sorted: stats.sorted_pairs,
                dropped: stats.dropped_pairs,
            });
        }

        let tiles = self.grid.tile_count() as usize;
        if self.tile_counts.len() != tiles || self.tile_offsets.len() != tiles || self.ids.len() != self.keys.len() {
            return Err(FrameCheckError::Shape);
        }

        let counted: u64 = self.tile_counts.iter().map(|&c| c as u64).sum();
        if counted != stats.sorted_pairs as u64 || self.keys.len() != stats.sorted_pairs as usize {
            return Err(FrameCheckError::Conservation {
                counted,
                sorted: stats.sorted_pairs,
            });
        }

        for (tile, (expected, actual)) in exclusive_scan(&self.tile_counts)
            .into_iter()
            .zip(self.tile_offsets.iter().copied())
            .enumerate()
        {
            if expected != actual {
                return Err(FrameCheckError::Offset {
                    tile: tile as u32,
                    expected,
                    actual,
                });
            }
        }

        if let Some(index) = self.keys.windows(2).position(|w| w[0] > w[1]) {
            return Err(FrameCheckError::Unsorted { index: index + 1 });
        }

        for tile in 0..self.grid.tile_count() {
            self.validate_tile(tile)?;
        }
        Ok(())
    }

    fn validate_tile(&self, tile: u32) -> Result<(), FrameCheckError> {
        let start = self.tile_offsets[tile as usize] as usize;
        let count = self.tile_counts[tile as usize] as usize;
        let tx = tile % self.grid.grid_x();
        let ty = tile / self.grid.grid_x();

        let mut previous_depth = 0u32;
        for index in start..start + count {
            let key = self.keys[index];
            let key_tile = self.grid.key_tile(key);
            if key_tile != tile {
                return Err(FrameCheckError::TileMismatch { index, tile, key_tile });
            }

            let id = self.ids[index];
            let splat = self
                .projected
                .get(id as usize)
                .filter(|s| !s.is_culled())
                .ok_or(FrameCheckError::BadSplat { index, id })?;

            let expected = self.grid.pack_key(tile, splat.depth);
            if key != expected {
                return Err(FrameCheckError::KeyMismatch { index, id, key, expected });
            }

            let rect = self.grid.tile_range(Vec2::from(splat.screen), Vec2::from(splat.extent), self.tile_size);
            if tx < rect.min_x || tx > rect.max_x || ty < rect.min_y || ty > rect.max_y {
                return Err(FrameCheckError::NoOverlap { id, tile });
            }

            // Depth is only ordered at key precision
            let quantized = splat.depth.to_bits() >> self.grid.tile_bits();
            if quantized < previous_depth {
                return Err(FrameCheckError::DepthOrder { tile, index });
            }
            previous_depth = quantized;
        }
        Ok(())
    }
}
