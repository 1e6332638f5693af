//! Per-frame inputs owned by the renderer
//!
//! External collaborators (UI, input) only touch these through the narrow
//! setters below; the GPU stages read them as uniforms.

use bitflags::bitflags;
use glam::Mat4;

bitflags! {
    /// Visualization toggles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Draw every splat centre as a small opaque dot
        const SHOW_POINTS = 1 << 0;
    }
}

/// Scalar render parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    scale_multiplier: f32,
    flags: RenderFlags,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            scale_multiplier: 1.0,
            flags: RenderFlags::empty(),
        }
    }
}

impl RenderParams {
    pub fn new(scale_multiplier: f32, show_points: bool) -> Self {
        let mut params = Self::default();
        params.set_scale_multiplier(scale_multiplier);
        params.set_show_points(show_points);
        params
    }

    pub fn scale_multiplier(&self) -> f32 {
        self.scale_multiplier
    }

    /// Set the splat scale multiplier; negative and NaN values become 0
    pub fn set_scale_multiplier(&mut self, value: f32) {
        self.scale_multiplier = if value > 0.0 { value } else { 0.0 };
    }

    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    pub fn show_points(&self) -> bool {
        self.flags.contains(RenderFlags::SHOW_POINTS)
    }

    pub fn set_show_points(&mut self, enabled: bool) {
        self.flags.set(RenderFlags::SHOW_POINTS, enabled);
    }

    /// Flip the show-points toggle, returning the new state
    pub fn toggle_show_points(&mut self) -> bool {
        self.flags.toggle(RenderFlags::SHOW_POINTS);
        self.show_points()
    }
}

/// Camera matrices consumed by the transform stage
///
/// Column-major, right-handed, camera looking down -Z. Depth in the pipeline
/// is the positive distance along the view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

impl CameraMatrices {
    /// Build from view and projection; the product is computed here
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view,
            projection,
            view_projection: projection * view,
        }
    }
}
