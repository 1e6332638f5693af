//! Scene input record
//!
//! The flat, attribute-major arrays a scene producer (file loader, procedural
//! builder) hands to the renderer. The renderer repacks them into
//! [`crate::GpuSplat3D`] on load.

use glam::Vec3;

use crate::error::SceneError;

/// Flat per-splat attribute arrays
///
/// Covariance is the upper triangle of the symmetric 3x3 matrix, stored as
/// `[xx, xy, xz, yy, yz, zz]` per splat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneInput {
    pub count: u32,
    pub positions: Vec<f32>,
    pub covariance: Vec<f32>,
    pub colors: Vec<f32>,
    pub opacities: Vec<f32>,
}

impl SceneInput {
    /// A scene with no splats
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pre-allocate room for `capacity` splats
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            count: 0,
            positions: Vec::with_capacity(capacity * 3),
            covariance: Vec::with_capacity(capacity * 6),
            colors: Vec::with_capacity(capacity * 3),
            opacities: Vec::with_capacity(capacity),
        }
    }

    /// Append one splat
    pub fn push(&mut self, position: Vec3, covariance: [f32; 6], color: Vec3, opacity: f32) {
        self.positions.extend_from_slice(&position.to_array());
        self.covariance.extend_from_slice(&covariance);
        self.colors.extend_from_slice(&color.to_array());
        self.opacities.push(opacity);
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Position of splat `i`
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    /// Check that every attribute array matches `count`
    ///
    /// Values are not inspected. NaN or infinite attributes are culled on
    /// the GPU by the transform stage.
    pub fn validate(&self) -> Result<(), SceneError> {
        let count = self.count as usize;
        let checks = [
            ("positions", 3, self.positions.len()),
            ("covariance", 6, self.covariance.len()),
            ("colors", 3, self.colors.len()),
            ("opacities", 1, self.opacities.len()),
        ];
        for (attribute, stride, actual) in checks {
            let expected = count * stride;
            if actual != expected {
                return Err(SceneError::LengthMismatch {
                    attribute,
                    count: self.count,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
