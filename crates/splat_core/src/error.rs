//! Error types for scene input and grid configuration

use thiserror::Error;

/// Errors raised while validating or packing a [`crate::SceneInput`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// An attribute array does not hold `count * stride` floats
    #[error("{attribute} has {actual} floats, expected {expected} for {count} splats")]
    LengthMismatch {
        attribute: &'static str,
        count: u32,
        expected: usize,
        actual: usize,
    },
    /// The scene holds more splats than a GPU index can address
    #[error("scene has {0} splats, more than the renderer can index")]
    TooManySplats(usize),
}

/// Errors raised by [`crate::TileGrid`] construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Grid dimensions must be powers of two so tile ids pack into the key
    #[error("tile grid {0}x{1} is not a power of two on both axes")]
    NotPowerOfTwo(u32, u32),
    /// Too many tiles leaves too few key bits for depth
    #[error("tile grid {grid_x}x{grid_y} needs {bits} tile bits, at most {max} are supported")]
    TooManyTiles {
        grid_x: u32,
        grid_y: u32,
        bits: u32,
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_error_display() {
        let err = SceneError::LengthMismatch {
            attribute: "positions",
            count: 2,
            expected: 6,
            actual: 5,
        };
        assert_eq!(
            err.to_string(),
            "positions has 5 floats, expected 6 for 2 splats"
        );
    }

    #[test]
    fn test_grid_error_display() {
        assert_eq!(
            GridError::NotPowerOfTwo(30, 32).to_string(),
            "tile grid 30x32 is not a power of two on both axes"
        );
        let err = GridError::TooManyTiles {
            grid_x: 128,
            grid_y: 128,
            bits: 14,
            max: 12,
        };
        assert!(err.to_string().contains("14 tile bits"));
    }
}
