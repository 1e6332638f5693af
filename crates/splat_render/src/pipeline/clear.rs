use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::kernel::{Access, Bindings, ComputeKernel, KernelDesc};
use crate::pipeline::shader_source;
use crate::pipeline::types::{RADIX_BINS, SORT_WORKGROUP};
use crate::schedule::{dispatch_size, ComputeStep, Dispatch};

const BINDINGS: Bindings = &[
    (BufferId::Globals, Access::Uniform),
    (BufferId::TileCounts, Access::ReadWrite),
    (BufferId::Counters, Access::ReadWrite),
    (BufferId::DigitCounts, Access::ReadWrite),
];

/// Zeroes tile counts, pair counters and radix digit totals each frame
pub struct ClearStage {
    kernel: ComputeKernel,
}

impl ClearStage {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            kernel: ComputeKernel::new(
                device,
                KernelDesc {
                    label: "Clear Counters",
                    source: shader_source!("clear.wgsl"),
                    bindings: BINDINGS,
                    pass_params: false,
                },
            ),
        }
    }

    pub fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError> {
        self.kernel.resolve(device, table)
    }

    pub fn step(&self, tile_count: u32) -> ComputeStep<'_> {
        ComputeStep {
            label: "clear",
            kernel: &self.kernel,
            pass_offset: None,
            dispatch: Dispatch::Workgroups(dispatch_size(tile_count.max(RADIX_BINS), SORT_WORKGROUP)),
        }
    }
}
