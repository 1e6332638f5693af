use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::kernel::{Access, Bindings, ComputeKernel, KernelDesc};
use crate::pipeline::shader_source;
use crate::pipeline::types::SPLAT_WORKGROUP;
use crate::schedule::{dispatch_size, ComputeStep, Dispatch};

const BINDINGS: Bindings = &[
    (BufferId::Globals, Access::Uniform),
    (BufferId::Viewport, Access::Uniform),
    (BufferId::Splats2D, Access::Read),
    (BufferId::TileCounts, Access::ReadWrite),
    (BufferId::Counters, Access::ReadWrite),
    (BufferId::SortKeys, Access::ReadWrite),
    (BufferId::SortValues, Access::ReadWrite),
];

/// Emits a (tile, depth) key and splat id for every tile a splat overlaps
///
/// Pair slots come from an atomic counter, so the unsorted order varies run
/// to run. The radix sort that follows makes the per-tile order deterministic
/// up to depth ties.
pub struct TileStage {
    kernel: ComputeKernel,
}

impl TileStage {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            kernel: ComputeKernel::new(
                device,
                KernelDesc {
                    label: "Splat Tiling",
                    source: shader_source!("tile.wgsl"),
                    bindings: BINDINGS,
                    pass_params: false,
                },
            ),
        }
    }

    pub fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError> {
        self.kernel.resolve(device, table)
    }

    pub fn step(&self, splat_count: u32) -> ComputeStep<'_> {
        ComputeStep {
            label: "tile",
            kernel: &self.kernel,
            pass_offset: None,
            dispatch: Dispatch::Workgroups(dispatch_size(splat_count, SPLAT_WORKGROUP)),
        }
    }
}
