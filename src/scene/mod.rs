//! Scene construction utilities
//!
//! Procedural demo scenes stand in for loading splat files from disk.

mod scene_builder;

use glam::Vec3;
use splat_core::SceneInput;

use crate::config::{ScenePreset, SceneConfig};

pub use scene_builder::SceneBuilder;

/// Build the demo scene selected by `config`
pub fn demo_scene(config: &SceneConfig) -> SceneInput {
    let count = config.splat_count;
    match config.preset {
        ScenePreset::Empty => SceneInput::empty(),
        ScenePreset::Cloud => SceneBuilder::with_capacity(count as usize)
            .add_random_cloud(count, 1.0, config.seed)
            .build(),
        ScenePreset::Showcase => {
            // About a fifth of the budget goes to the floor
            let per_side = ((count / 5) as f32).sqrt() as u32;
            let shell = count - per_side * per_side;
            SceneBuilder::with_capacity(count as usize)
                .add_sphere_shell(Vec3::ZERO, 1.0, shell)
                .add_ground_grid(-1.3, 4.0, per_side)
                .build()
        }
    }
}
