use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::kernel::{Access, Bindings, ComputeKernel, KernelDesc};
use crate::pipeline::shader_source;
use crate::schedule::{ComputeStep, Dispatch};

const BINDINGS: Bindings = &[
    (BufferId::Globals, Access::Uniform),
    (BufferId::TileCounts, Access::Read),
    (BufferId::TileOffsets, Access::ReadWrite),
];

/// Exclusive prefix sum over tile counts, run as a single workgroup
///
/// Tile counts are bounded by the grid (at most 4096 tiles), so one
/// workgroup of 256 threads scanning 16-tile runs is enough.
pub struct TileOffsetsStage {
    kernel: ComputeKernel,
}

impl TileOffsetsStage {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            kernel: ComputeKernel::new(
                device,
                KernelDesc {
                    label: "Tile Offsets",
                    source: shader_source!("tile_offsets.wgsl"),
                    bindings: BINDINGS,
                    pass_params: false,
                },
            ),
        }
    }

    pub fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError> {
        self.kernel.resolve(device, table)
    }

    pub fn step(&self) -> ComputeStep<'_> {
        ComputeStep {
            label: "tile offsets",
            kernel: &self.kernel,
            pass_offset: None,
            dispatch: Dispatch::Workgroups(1),
        }
    }
}

/// Exclusive prefix sum, the CPU reference for the tile offsets kernel
pub fn exclusive_scan(counts: &[u32]) -> Vec<u32> {
    counts
        .iter()
        .scan(0u32, |running, &count| {
            let offset = *running;
            *running += count;
            Some(offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_scan() {
        assert_eq!(exclusive_scan(&[3, 0, 2, 5]), vec![0, 3, 3, 5]);
        assert!(exclusive_scan(&[]).is_empty());
    }
}
