//! Compute kernels with table-resolved bindings
//!
//! A kernel declares its bindings as an ordered list of (buffer, access)
//! pairs. The bind group layout is generated from that list, and the bind
//! group is rebuilt from the [`BufferTable`] whenever the table generation
//! changes. The same list feeds the pass scheduler's hazard tracking.

use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::types::RadixPassParams;
use crate::schedule::Dispatch;

/// How a stage touches a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Uniform,
    Read,
    ReadWrite,
}

impl Access {
    pub fn writes(self) -> bool {
        matches!(self, Access::ReadWrite)
    }
}

/// Ordered binding list; binding index = position in the slice
pub type Bindings = &'static [(BufferId, Access)];

/// Static description of a compute kernel
pub struct KernelDesc {
    pub label: &'static str,
    pub source: &'static str,
    pub bindings: Bindings,
    /// Bind the per-pass radix uniform at group 1 with a dynamic offset
    pub pass_params: bool,
}

/// A compute pipeline plus its lazily resolved bind groups
pub struct ComputeKernel {
    label: &'static str,
    bindings: Bindings,
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    pass_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    pass_bind_group: Option<wgpu::BindGroup>,
    generation: Option<u64>,
}

impl ComputeKernel {
    pub fn new(device: &wgpu::Device, desc: KernelDesc) -> Self {
        let entries = layout_entries(desc.bindings, wgpu::ShaderStages::COMPUTE);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(desc.label),
            entries: &entries,
        });

        let pass_layout = desc.pass_params.then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Radix Pass Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<RadixPassParams>() as u64),
                    },
                    count: None,
                }],
            })
        });

        let mut layouts = vec![&layout];
        if let Some(pass_layout) = &pass_layout {
            layouts.push(pass_layout);
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self {
            label: desc.label,
            bindings: desc.bindings,
            pipeline,
            layout,
            pass_layout,
            bind_group: None,
            pass_bind_group: None,
            generation: None,
        }
    }

    /// Rebuild bind groups if the table changed since the last resolve
    pub fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError> {
        if self.generation == Some(table.generation()) {
            return Ok(());
        }

        self.bind_group = Some(bind_group_from_table(device, self.label, &self.layout, table, self.bindings)?);

        if let Some(pass_layout) = &self.pass_layout {
            let radix = table.get(BufferId::RadixPasses)?;
            self.pass_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Radix Pass Bind Group"),
                layout: pass_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: radix,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<RadixPassParams>() as u64),
                    }),
                }],
            }));
        }

        log::debug!("Rebound '{}' at table generation {}", self.label, table.generation());
        self.generation = Some(table.generation());
        Ok(())
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn bindings(&self) -> Bindings {
        self.bindings
    }

    /// Record this kernel into an open compute pass
    pub(crate) fn record(
        &self,
        pass: &mut wgpu::ComputePass<'_>,
        pass_offset: Option<u32>,
        dispatch: &Dispatch<'_>,
    ) -> Result<(), RenderError> {
        let bind_group = self.bind_group.as_ref().ok_or(RenderError::Unbound(self.label))?;
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        if let Some(pass_group) = &self.pass_bind_group {
            pass.set_bind_group(1, pass_group, &[pass_offset.unwrap_or(0)]);
        }
        match dispatch {
            Dispatch::Workgroups(x) => pass.dispatch_workgroups(*x, 1, 1),
            Dispatch::Indirect { buffer, .. } => pass.dispatch_workgroups_indirect(buffer, 0),
        }
        Ok(())
    }
}

/// Layout entries for a binding list, visible to the given stages
pub fn layout_entries(bindings: Bindings, visibility: wgpu::ShaderStages) -> Vec<wgpu::BindGroupLayoutEntry> {
    bindings
        .iter()
        .enumerate()
        .map(|(i, (_, access))| wgpu::BindGroupLayoutEntry {
            binding: i as u32,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: match access {
                    Access::Uniform => wgpu::BufferBindingType::Uniform,
                    Access::Read => wgpu::BufferBindingType::Storage { read_only: true },
                    Access::ReadWrite => wgpu::BufferBindingType::Storage { read_only: false },
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect()
}

/// Build a bind group by resolving each binding from the table
pub fn bind_group_from_table(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    table: &BufferTable,
    bindings: Bindings,
) -> Result<wgpu::BindGroup, RenderError> {
    let entries = bindings
        .iter()
        .enumerate()
        .map(|(i, (id, _))| {
            Ok(wgpu::BindGroupEntry {
                binding: i as u32,
                resource: table.binding(*id)?,
            })
        })
        .collect::<Result<Vec<_>, RenderError>>()?;

    Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    }))
}
