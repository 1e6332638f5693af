use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::kernel::{Access, Bindings, ComputeKernel, KernelDesc};
use crate::pipeline::shader_source;
use crate::pipeline::types::SPLAT_WORKGROUP;
use crate::schedule::{dispatch_size, ComputeStep, Dispatch};

const BINDINGS: Bindings = &[
    (BufferId::Camera, Access::Uniform),
    (BufferId::Globals, Access::Uniform),
    (BufferId::Viewport, Access::Uniform),
    (BufferId::RenderParams, Access::Uniform),
    (BufferId::Splats3D, Access::Read),
    (BufferId::Splats2D, Access::ReadWrite),
];

/// Projects 3D splats to screen-space ellipses, one thread per splat
pub struct TransformStage {
    kernel: ComputeKernel,
}

impl TransformStage {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            kernel: ComputeKernel::new(
                device,
                KernelDesc {
                    label: "Splat Transform",
                    source: shader_source!("transform.wgsl"),
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
            label: "transform",
            kernel: &self.kernel,
            pass_offset: None,
            dispatch: Dispatch::Workgroups(dispatch_size(splat_count, SPLAT_WORKGROUP)),
        }
    }
}
