//! SceneBuilder - Procedural splat scene construction
//!
//! Provides a fluent API for building splat scenes from simple shapes.

use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splat_core::precompute::{covariance_from_scale_rotation, normalize_extent};
use splat_core::SceneInput;

/// Builder for procedural splat scenes
///
/// # Example
/// ```ignore
/// let scene = SceneBuilder::new()
///     .add_sphere_shell(Vec3::ZERO, 1.0, 5000)
///     .add_ground_grid(-1.2, 4.0, 64)
///     .build();
/// ```
pub struct SceneBuilder {
    scene: SceneInput,
}

impl SceneBuilder {
    /// Create a new scene builder
    pub fn new() -> Self {
        Self {
            scene: SceneInput::empty(),
        }
    }

    /// Create a scene builder with room for `capacity` splats
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scene: SceneInput::with_capacity(capacity),
        }
    }

    /// Add `count` splats evenly spread over a sphere surface
    ///
    /// Splats are flattened along the surface normal and colored by it.
    pub fn add_sphere_shell(mut self, center: Vec3, radius: f32, count: u32) -> Self {
        let golden_angle = std::f32::consts::PI * (3.0 - 5f32.sqrt());
        // Disc radius so neighbouring splats just overlap
        let footprint = radius * (4.0 / count.max(1) as f32).sqrt();

        for i in 0..count {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            let normal = Vec3::new(ring * theta.cos(), y, ring * theta.sin());

            let rotation = Quat::from_rotation_arc(Vec3::Z, normal);
            let scale = Vec3::new(footprint, footprint, footprint * 0.1);
            let color = normal * 0.5 + Vec3::splat(0.5);

            self.scene.push(
                center + normal * radius,
                covariance_from_scale_rotation(scale, rotation),
                color,
                0.9,
            );
        }
        self
    }

    /// Add a `per_side` x `per_side` checkerboard of flat splats at height `y`
    pub fn add_ground_grid(mut self, y: f32, size: f32, per_side: u32) -> Self {
        if per_side == 0 {
            return self;
        }
        let cell = size / per_side as f32;
        let scale = Vec3::new(cell * 0.5, cell * 0.05, cell * 0.5);
        let covariance = covariance_from_scale_rotation(scale, Quat::IDENTITY);

        for row in 0..per_side {
            for col in 0..per_side {
                let x = -size * 0.5 + (col as f32 + 0.5) * cell;
                let z = -size * 0.5 + (row as f32 + 0.5) * cell;
                let shade = if (row + col) % 2 == 0 { 0.8 } else { 0.3 };
                self.scene.push(Vec3::new(x, y, z), covariance, Vec3::splat(shade), 1.0);
            }
        }
        self
    }

    /// Add `count` randomly placed, oriented and colored splats inside a cube
    /// of half-size `extent`
    pub fn add_random_cloud(mut self, count: u32, extent: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let extent = extent.abs().max(f32::EPSILON);
        let base = extent / (count.max(1) as f32).cbrt();

        for _ in 0..count {
            let position = Vec3::new(
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            );
            let rotation = Quat::from_euler(
                EulerRot::YXZ,
                rng.random_range(0.0..std::f32::consts::TAU),
                rng.random_range(0.0..std::f32::consts::TAU),
                rng.random_range(0.0..std::f32::consts::TAU),
            );
            let scale = Vec3::new(
                base * rng.random_range(0.1..0.6),
                base * rng.random_range(0.1..0.6),
                base * rng.random_range(0.1..0.6),
            );
            let color = Vec3::new(rng.random(), rng.random(), rng.random());

            self.scene.push(
                position,
                covariance_from_scale_rotation(scale, rotation),
                color,
                rng.random_range(0.3..1.0),
            );
        }
        self
    }

    /// Number of splats added so far
    pub fn len(&self) -> usize {
        self.scene.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scene.is_empty()
    }

    /// Build the scene, rescaled so its largest extent spans [-1, 1]
    pub fn build(mut self) -> SceneInput {
        normalize_extent(&mut self.scene);
        self.scene
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_abs_coordinate(scene: &SceneInput) -> f32 {
        (0..scene.len())
            .map(|i| scene.position(i).abs().max_element())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_empty_scene() {
        let scene = SceneBuilder::new().build();
        assert!(scene.is_empty());
    }

    #[test]
    fn test_sphere_shell_count_and_radius() {
        let builder = SceneBuilder::new().add_sphere_shell(Vec3::ZERO, 2.0, 500);
        assert_eq!(builder.len(), 500);

        let scene = builder.build();
        scene.validate().unwrap();
        for i in 0..scene.len() {
            // Normalized to unit radius
            assert!((scene.position(i).length() - 1.0).abs() < 0.02);
        }
    }

    #[test]
    fn test_ground_grid_is_flat() {
        let scene = SceneBuilder::new().add_ground_grid(-1.0, 4.0, 8).build();
        assert_eq!(scene.len(), 64);
        let y0 = scene.position(0).y;
        for i in 0..scene.len() {
            assert_eq!(scene.position(i).y, y0);
        }
    }

    #[test]
    fn test_random_cloud_is_seeded() {
        let a = SceneBuilder::new().add_random_cloud(200, 5.0, 7).build();
        let b = SceneBuilder::new().add_random_cloud(200, 5.0, 7).build();
        let c = SceneBuilder::new().add_random_cloud(200, 5.0, 8).build();

        assert_eq!(a.positions, b.positions);
        assert_eq!(a.covariance, b.covariance);
        assert_ne!(a.positions, c.positions);
        a.validate().unwrap();
    }

    #[test]
    fn test_build_normalizes_extent() {
        let scene = SceneBuilder::new()
            .add_random_cloud(300, 40.0, 1)
            .add_ground_grid(-50.0, 80.0, 4)
            .build();
        let max = max_abs_coordinate(&scene);
        assert!(max <= 1.0 + 1e-4);
        assert!(max > 0.9);
    }
}
