//! Fullscreen composite pass
//!
//! A single triangle covers the target; the fragment shader walks the sorted
//! id range of its pixel's tile and blends front to back. The target is
//! cleared to the background first, and the shader also writes the
//! background-blended result, so pixels outside every splat come out as the
//! clear colour.

use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::kernel::{bind_group_from_table, layout_entries, Access, Bindings};
use crate::pipeline::shader_source;

const BINDINGS: Bindings = &[
    (BufferId::Globals, Access::Uniform),
    (BufferId::Viewport, Access::Uniform),
    (BufferId::RenderParams, Access::Uniform),
    (BufferId::Splats2D, Access::Read),
    (BufferId::SortValues, Access::Read),
    (BufferId::TileCounts, Access::Read),
    (BufferId::TileOffsets, Access::Read),
];

pub struct CompositeStage {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    generation: Option<u64>,
}

impl CompositeStage {
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let entries = layout_entries(BINDINGS, wgpu::ShaderStages::FRAGMENT);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source!("composite.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Composite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            layout,
            bind_group: None,
            generation: None,
        }
    }

    pub fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError> {
        if self.generation == Some(table.generation()) {
            return Ok(());
        }
        self.bind_group = Some(bind_group_from_table(device, "Composite Bind Group", &self.layout, table, BINDINGS)?);
        self.generation = Some(table.generation());
        Ok(())
    }

    /// Clear `view` to `background` and composite every pixel into it
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        background: wgpu::Color,
    ) -> Result<(), RenderError> {
        let bind_group = self.bind_group.as_ref().ok_or(RenderError::Unbound("Composite"))?;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(())
    }
}
