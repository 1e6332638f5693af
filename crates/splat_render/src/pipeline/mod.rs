//! Pipeline stages
//!
//! Each stage owns one or more [`ComputeKernel`]s (or the composite render
//! pipeline) together with its binding list. Shaders are assembled from the
//! shared `common.wgsl` plus the stage's own source.

pub mod clear;
pub mod composite;
pub mod kernel;
pub mod prefix_sum;
pub mod radix_sort;
pub mod tile;
pub mod transform;
pub mod types;

pub use clear::ClearStage;
pub use composite::CompositeStage;
pub use kernel::{Access, Bindings, ComputeKernel, KernelDesc};
pub use prefix_sum::TileOffsetsStage;
pub use radix_sort::{RadixSort, SortStrategy};
pub use tile::TileStage;
pub use transform::TransformStage;

/// Prefix a stage source with the shared WGSL declarations
macro_rules! shader_source {
    ($file:literal) => {
        concat!(include_str!("../shaders/common.wgsl"), include_str!(concat!("../shaders/", $file)))
    };
}

pub(crate) use shader_source;
