//! GPU-compatible splat layouts
//!
//! These types match the WGSL structs in the render crate byte for byte.
//! All types derive Pod and Zeroable for direct buffer uploads.

use bytemuck::{Pod, Zeroable};

use crate::error::SceneError;
use crate::scene::SceneInput;

/// Depth written for culled splats; the tiling stage skips anything at or past it
pub const DEPTH_CULLED: f32 = 3.0e38;

/// Interleaved per-splat input consumed by the transform stage
/// Layout: 64 bytes (must match `Splat3D` in common.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuSplat3D {
    pub position: [f32; 3],
    pub opacity: f32,
    /// Covariance row 0: xx, xy, xz
    pub cov_a: [f32; 3],
    pub _pad0: f32,
    /// Covariance lower block: yy, yz, zz
    pub cov_b: [f32; 3],
    pub _pad1: f32,
    pub color: [f32; 3],
    pub _pad2: f32,
}

/// Projected splat produced by the transform stage
/// Layout: 48 bytes (must match `Splat2D` in common.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuSplat2D {
    /// Pixel-space centre, origin top-left
    pub screen: [f32; 2],
    /// Half-size of the 3-sigma bounding box in pixels
    pub extent: [f32; 2],
    /// Inverse 2D covariance (a, b, c) of `[[a, b], [b, c]]`
    pub conic: [f32; 3],
    pub opacity: f32,
    pub color: [f32; 3],
    /// View-space distance, or [`DEPTH_CULLED`]
    pub depth: f32,
}

impl GpuSplat2D {
    pub fn is_culled(&self) -> bool {
        self.depth >= DEPTH_CULLED
    }
}

/// Repack a scene into the interleaved layout the transform stage reads
pub fn pack_scene(scene: &SceneInput) -> Result<Vec<GpuSplat3D>, SceneError> {
    scene.validate()?;
    if scene.len() > u32::MAX as usize / 4 {
        return Err(SceneError::TooManySplats(scene.len()));
    }

    let splats = (0..scene.len())
        .map(|i| {
            let p = &scene.positions[i * 3..i * 3 + 3];
            let c = &scene.covariance[i * 6..i * 6 + 6];
            let rgb = &scene.colors[i * 3..i * 3 + 3];
            GpuSplat3D {
                position: [p[0], p[1], p[2]],
                opacity: scene.opacities[i],
                cov_a: [c[0], c[1], c[2]],
                cov_b: [c[3], c[4], c[5]],
                color: [rgb[0], rgb[1], rgb[2]],
                ..Default::default()
            }
        })
        .collect();

    Ok(splats)
}
