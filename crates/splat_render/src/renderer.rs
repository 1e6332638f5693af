//! Per-frame orchestration of the splat pipeline
//!
//! [`SplatRenderer`] owns the buffer lifecycle and every stage. A frame is
//! encoded as one compute schedule (clear, transform, tile, tile offsets,
//! sort) followed by the composite render pass, all into the caller's
//! command encoder.

use splat_core::{CameraMatrices, GpuSplat2D, RenderParams, SceneInput, TileGrid};

use crate::buffers::{BufferId, BufferLifecycle, SceneLayout};
use crate::diagnostics::{FrameReadback, FrameStats};
use crate::error::RenderError;
use crate::pipeline::types::PairCounters;
use crate::pipeline::{ClearStage, CompositeStage, RadixSort, SortStrategy, TileOffsetsStage, TileStage, TransformStage};
use crate::readback::read_buffer;
use crate::schedule::PassSchedule;
use crate::settings::RendererSettings;

pub struct SplatRenderer {
    buffers: BufferLifecycle,
    clear: ClearStage,
    transform: TransformStage,
    tile: TileStage,
    tile_offsets: TileOffsetsStage,
    sort: Box<dyn SortStrategy>,
    composite: CompositeStage,
    params: RenderParams,
}

impl SplatRenderer {
    /// Build all stages for `target_format` and bind them to an empty scene
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        settings: RendererSettings,
    ) -> Result<Self, RenderError> {
        let buffers = BufferLifecycle::new(device, settings);

        let mut renderer = Self {
            buffers,
            clear: ClearStage::new(device),
            transform: TransformStage::new(device),
            tile: TileStage::new(device),
            tile_offsets: TileOffsetsStage::new(device),
            sort: Box::new(RadixSort::new(device)),
            composite: CompositeStage::new(device, target_format),
            params: RenderParams::default(),
        };
        renderer.rebind(device)?;

        log::info!(
            "Splat renderer ready: {}x{} tiles, {} sort",
            settings.grid.grid_x(),
            settings.grid.grid_y(),
            renderer.sort.name()
        );
        Ok(renderer)
    }

    /// Replace the scene; every stage is rebound before this returns
    pub fn load_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneInput,
    ) -> Result<SceneLayout, RenderError> {
        let layout = self.buffers.load_scene(device, queue, scene)?;
        self.rebind(device)?;
        log::info!(
            "Loaded {} splats ({} sort pair slots)",
            layout.splat_count,
            layout.pair_capacity
        );
        Ok(layout)
    }

    fn rebind(&mut self, device: &wgpu::Device) -> Result<(), RenderError> {
        let table = self.buffers.table();
        self.clear.resolve(device, table)?;
        self.transform.resolve(device, table)?;
        self.tile.resolve(device, table)?;
        self.tile_offsets.resolve(device, table)?;
        self.sort.resolve(device, table)?;
        self.composite.resolve(device, table)
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, width: u32, height: u32) -> Result<(), RenderError> {
        self.buffers.resize(queue, width, height)
    }

    pub fn set_camera(&self, queue: &wgpu::Queue, camera: &CameraMatrices) -> Result<(), RenderError> {
        self.buffers.write_camera(queue, camera)
    }

    pub fn set_render_params(&mut self, queue: &wgpu::Queue, params: RenderParams) -> Result<(), RenderError> {
        self.params = params;
        self.buffers.write_render_params(queue, &params)
    }

    pub fn render_params(&self) -> RenderParams {
        self.params
    }

    /// Encode every compute stage of a frame
    pub fn encode_compute(&self, encoder: &mut wgpu::CommandEncoder) -> Result<(), RenderError> {
        let table = self.buffers.table();
        let globals = self.buffers.global_params();

        let mut schedule = PassSchedule::new();
        schedule.push(self.clear.step(globals.tile_count));
        schedule.push(self.transform.step(globals.splat_count));
        schedule.push(self.tile.step(globals.splat_count));
        schedule.push(self.tile_offsets.step());
        self.sort.schedule(&mut schedule, table)?;
        schedule.encode(encoder)
    }

    /// Encode a full frame into `view`
    pub fn encode_frame(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) -> Result<(), RenderError> {
        self.encode_compute(encoder)?;
        self.composite
            .encode(encoder, view, self.buffers.settings().background_color())
    }

    pub fn splat_count(&self) -> u32 {
        self.buffers.layout().splat_count
    }

    pub fn layout(&self) -> SceneLayout {
        self.buffers.layout()
    }

    pub fn grid(&self) -> TileGrid {
        self.buffers.settings().grid
    }

    pub fn settings(&self) -> &RendererSettings {
        self.buffers.settings()
    }

    /// Pair counters of the last submitted frame
    pub fn read_stats(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<FrameStats, RenderError> {
        let table = self.buffers.table();
        let counters = read_buffer::<PairCounters>(device, queue, table.get(BufferId::Counters)?, 1)?;
        let counters = counters.first().copied().unwrap_or_default();
        Ok(FrameStats::from_counters(counters, self.buffers.layout().pair_capacity))
    }

    /// Copy the tiling and sort output of the last submitted frame
    pub fn read_frame(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<FrameReadback, RenderError> {
        let stats = self.read_stats(device, queue)?;
        let table = self.buffers.table();
        let grid = self.grid();
        let tiles = grid.tile_count() as usize;
        let pairs = stats.sorted_pairs as usize;
        let viewport = self.buffers.viewport();

        Ok(FrameReadback {
            grid,
            tile_size: (viewport.tile_width, viewport.tile_height),
            tile_counts: read_buffer(device, queue, table.get(BufferId::TileCounts)?, tiles)?,
            tile_offsets: read_buffer(device, queue, table.get(BufferId::TileOffsets)?, tiles)?,
            keys: read_buffer(device, queue, table.get(BufferId::SortKeys)?, pairs)?,
            ids: read_buffer(device, queue, table.get(BufferId::SortValues)?, pairs)?,
            projected: read_buffer::<GpuSplat2D>(
                device,
                queue,
                table.get(BufferId::Splats2D)?,
                self.splat_count() as usize,
            )?,
            stats,
        })
    }

    /// Sort arbitrary pairs with the pipeline's sort and read them back
    ///
    /// Overwrites the current frame's pair buffers and counters.
    pub fn run_sort_only(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        keys: &[u32],
        values: &[u32],
    ) -> Result<(Vec<u32>, Vec<u32>), RenderError> {
        let capacity = self.buffers.layout().pair_capacity;
        if keys.len() != values.len() || keys.len() > capacity as usize {
            return Err(RenderError::SortCapacity {
                pairs: keys.len().max(values.len()),
                capacity,
            });
        }

        let table = self.buffers.table();
        queue.write_buffer(table.get(BufferId::SortKeys)?, 0, bytemuck::cast_slice(keys));
        queue.write_buffer(table.get(BufferId::SortValues)?, 0, bytemuck::cast_slice(values));
        let counters = PairCounters {
            reserved: keys.len() as u32,
            overflow: 0,
        };
        queue.write_buffer(table.get(BufferId::Counters)?, 0, bytemuck::bytes_of(&counters));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Sort Only Encoder"),
        });
        let mut schedule = PassSchedule::new();
        self.sort.schedule(&mut schedule, table)?;
        schedule.encode(&mut encoder)?;
        queue.submit(std::iter::once(encoder.finish()));

        let sorted_keys = read_buffer(device, queue, table.get(BufferId::SortKeys)?, keys.len())?;
        let sorted_values = read_buffer(device, queue, table.get(BufferId::SortValues)?, values.len())?;
        Ok((sorted_keys, sorted_values))
    }
}
