//! Buffer arena and scene-driven buffer lifecycle
//!
//! Every GPU buffer the pipeline touches lives in a [`BufferTable`] under a
//! logical [`BufferId`]. Stages never hold raw buffer handles: they resolve
//! their bind groups from the table and rebuild them whenever the table's
//! generation moves. Replacing an entry destroys the previous allocation.
//!
//! [`BufferLifecycle`] owns the table. Count-independent buffers (uniforms,
//! counters, the grid-sized tile arrays) are created once; everything sized by
//! the splat count is replaced as a unit on scene load, together with the
//! global params that describe it.

use std::collections::HashMap;

use splat_core::{pack_scene, CameraMatrices, GpuSplat2D, GpuSplat3D, RenderParams, SceneInput, RADIX_PASSES};
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::pipeline::types::{
    CameraUniform, GlobalParams, PairCounters, RadixPassParams, RenderUniform, SortDispatch,
    ViewportParams, RADIX_BINS, RADIX_PASS_STRIDE, SORT_BLOCK,
};
use crate::settings::RendererSettings;

/// Hard cap on sortable (splat, tile) pairs per frame
pub const MAX_SORT_PAIRS: u32 = 1 << 25;

/// Logical names of every pipeline buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferId {
    Camera,
    Globals,
    Viewport,
    RenderParams,
    RadixPasses,
    Splats3D,
    Splats2D,
    TileCounts,
    TileOffsets,
    Counters,
    SortDispatch,
    SortKeys,
    SortValues,
    SortKeysScratch,
    SortValuesScratch,
    GroupHistogram,
    DigitCounts,
}

impl BufferId {
    pub fn label(self) -> &'static str {
        match self {
            BufferId::Camera => "Camera Uniform Buffer",
            BufferId::Globals => "Global Params Buffer",
            BufferId::Viewport => "Viewport Params Buffer",
            BufferId::RenderParams => "Render Params Buffer",
            BufferId::RadixPasses => "Radix Pass Params Buffer",
            BufferId::Splats3D => "Splat3D Buffer",
            BufferId::Splats2D => "Splat2D Buffer",
            BufferId::TileCounts => "Tile Counts Buffer",
            BufferId::TileOffsets => "Tile Offsets Buffer",
            BufferId::Counters => "Pair Counters Buffer",
            BufferId::SortDispatch => "Sort Dispatch Buffer",
            BufferId::SortKeys => "Sort Keys Buffer",
            BufferId::SortValues => "Sort Values Buffer",
            BufferId::SortKeysScratch => "Sort Keys Scratch Buffer",
            BufferId::SortValuesScratch => "Sort Values Scratch Buffer",
            BufferId::GroupHistogram => "Radix Group Histogram Buffer",
            BufferId::DigitCounts => "Radix Digit Counts Buffer",
        }
    }
}

/// Arena of GPU buffers keyed by logical name
#[derive(Default)]
pub struct BufferTable {
    entries: HashMap<BufferId, wgpu::Buffer>,
    generation: u64,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a buffer, destroying whatever was there before
    pub fn insert(&mut self, id: BufferId, buffer: wgpu::Buffer) {
        if let Some(old) = self.entries.insert(id, buffer) {
            old.destroy();
        }
        self.generation += 1;
    }

    pub fn get(&self, id: BufferId) -> Result<&wgpu::Buffer, RenderError> {
        self.entries.get(&id).ok_or(RenderError::MissingBuffer(id))
    }

    pub fn binding(&self, id: BufferId) -> Result<wgpu::BindingResource<'_>, RenderError> {
        Ok(self.get(id)?.as_entire_binding())
    }

    pub fn contains(&self, id: BufferId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Size in bytes of an allocated buffer
    pub fn size(&self, id: BufferId) -> Option<u64> {
        self.entries.get(&id).map(|b| b.size())
    }

    /// Bumped on every insert; stages compare it to decide when to rebind
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Sizes of everything that depends on the splat count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLayout {
    pub splat_count: u32,
    /// Capacity of the sort key/value buffers, a multiple of [`SORT_BLOCK`]
    pub pair_capacity: u32,
}

impl SceneLayout {
    /// Layout for `splat_count` splats under a device storage binding limit
    pub fn for_splat_count(splat_count: u32, pairs_per_splat: u32, max_binding_size: u64) -> Self {
        let limit = (max_binding_size / 4).min(MAX_SORT_PAIRS as u64) as u32;
        let limit = (limit / SORT_BLOCK).max(1) * SORT_BLOCK;

        let wanted = (splat_count as u64 * pairs_per_splat.max(1) as u64).min(limit as u64) as u32;
        let pair_capacity = (wanted.div_ceil(SORT_BLOCK).max(1) * SORT_BLOCK).min(limit);

        Self {
            splat_count,
            pair_capacity,
        }
    }

    /// Elements allocated per splat buffer; never zero so bindings stay valid
    pub fn splat_slots(&self) -> u64 {
        self.splat_count.max(1) as u64
    }

    pub fn max_sort_groups(&self) -> u32 {
        self.pair_capacity / SORT_BLOCK
    }

    pub fn splats3d_bytes(&self) -> u64 {
        self.splat_slots() * std::mem::size_of::<GpuSplat3D>() as u64
    }

    pub fn splats2d_bytes(&self) -> u64 {
        self.splat_slots() * std::mem::size_of::<GpuSplat2D>() as u64
    }

    pub fn pair_bytes(&self) -> u64 {
        self.pair_capacity as u64 * 4
    }

    pub fn histogram_bytes(&self) -> u64 {
        self.max_sort_groups() as u64 * RADIX_BINS as u64 * 4
    }
}

/// Owns the buffer table and keeps it consistent with the loaded scene
pub struct BufferLifecycle {
    table: BufferTable,
    settings: RendererSettings,
    layout: SceneLayout,
    viewport: ViewportParams,
    max_binding_size: u64,
}

impl BufferLifecycle {
    /// Allocate count-independent buffers and an empty scene
    pub fn new(device: &wgpu::Device, settings: RendererSettings) -> Self {
        let max_binding_size = device.limits().max_storage_buffer_binding_size as u64;
        let grid = settings.grid;
        let mut table = BufferTable::new();

        let uniform = wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST;
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;

        table.insert(
            BufferId::Camera,
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(BufferId::Camera.label()),
                contents: bytemuck::bytes_of(&CameraUniform::default()),
                usage: uniform,
            }),
        );
        let layout = SceneLayout::for_splat_count(0, settings.pairs_per_splat, max_binding_size);
        let viewport = ViewportParams::new(&grid, 1, 1);
        let globals = GlobalParams::new(&grid, 0, layout.pair_capacity, settings.max_splats_per_tile);
        table.insert(
            BufferId::Globals,
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(BufferId::Globals.label()),
                contents: bytemuck::bytes_of(&globals),
                usage: uniform,
            }),
        );
        table.insert(
            BufferId::Viewport,
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(BufferId::Viewport.label()),
                contents: bytemuck::bytes_of(&viewport),
                usage: uniform,
            }),
        );
        table.insert(
            BufferId::RenderParams,
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(BufferId::RenderParams.label()),
                contents: bytemuck::bytes_of(&RenderUniform::new(&RenderParams::default(), settings.background)),
                usage: uniform,
            }),
        );

        // One 16-byte uniform per pass, each at a dynamic-offset boundary
        let mut radix = vec![0u8; RADIX_PASSES as usize * RADIX_PASS_STRIDE as usize];
        for pass in 0..RADIX_PASSES as usize {
            let params = RadixPassParams {
                shift: pass as u32 * 8,
                ..Default::default()
            };
            let start = pass * RADIX_PASS_STRIDE as usize;
            radix[start..start + 16].copy_from_slice(bytemuck::bytes_of(&params));
        }
        table.insert(
            BufferId::RadixPasses,
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(BufferId::RadixPasses.label()),
                contents: &radix,
                usage: wgpu::BufferUsages::UNIFORM,
            }),
        );

        let tile_bytes = grid.tile_count() as u64 * 4;
        table.insert(BufferId::TileCounts, create_zeroed(device, BufferId::TileCounts, tile_bytes, storage));
        table.insert(BufferId::TileOffsets, create_zeroed(device, BufferId::TileOffsets, tile_bytes, storage));
        table.insert(
            BufferId::Counters,
            create_zeroed(device, BufferId::Counters, std::mem::size_of::<PairCounters>() as u64, storage),
        );
        table.insert(
            BufferId::SortDispatch,
            create_zeroed(
                device,
                BufferId::SortDispatch,
                std::mem::size_of::<SortDispatch>() as u64,
                storage | wgpu::BufferUsages::INDIRECT,
            ),
        );
        table.insert(
            BufferId::DigitCounts,
            create_zeroed(device, BufferId::DigitCounts, RADIX_BINS as u64 * 4, storage),
        );

        let mut lifecycle = Self {
            table,
            settings,
            layout,
            viewport,
            max_binding_size,
        };
        lifecycle.allocate_scene_buffers(device, &[], layout);
        lifecycle
    }

    /// Replace every splat-count-sized buffer for a new scene
    ///
    /// Global params are written in the same call, so the next submitted
    /// frame sees buffers and params that agree.
    pub fn load_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneInput,
    ) -> Result<SceneLayout, RenderError> {
        let splats = pack_scene(scene)?;
        let layout = SceneLayout::for_splat_count(scene.count, self.settings.pairs_per_splat, self.max_binding_size);

        let bytes = layout.splats3d_bytes();
        if bytes > self.max_binding_size {
            return Err(RenderError::SceneTooLarge {
                splats: scene.count,
                bytes,
                limit: self.max_binding_size,
            });
        }

        self.allocate_scene_buffers(device, &splats, layout);
        self.write_globals(queue);
        Ok(layout)
    }

    fn allocate_scene_buffers(&mut self, device: &wgpu::Device, splats: &[GpuSplat3D], layout: SceneLayout) {
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;

        let splats3d = if splats.is_empty() {
            create_zeroed(device, BufferId::Splats3D, layout.splats3d_bytes(), storage)
        } else {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(BufferId::Splats3D.label()),
                contents: bytemuck::cast_slice(splats),
                usage: storage,
            })
        };

        self.table.insert(BufferId::Splats3D, splats3d);
        self.table.insert(
            BufferId::Splats2D,
            create_zeroed(device, BufferId::Splats2D, layout.splats2d_bytes(), storage),
        );
        for id in [
            BufferId::SortKeys,
            BufferId::SortValues,
            BufferId::SortKeysScratch,
            BufferId::SortValuesScratch,
        ] {
            self.table.insert(id, create_zeroed(device, id, layout.pair_bytes(), storage));
        }
        self.table.insert(
            BufferId::GroupHistogram,
            create_zeroed(device, BufferId::GroupHistogram, layout.histogram_bytes(), storage),
        );

        self.layout = layout;
    }

    /// Viewport changes only touch the viewport uniform
    pub fn resize(&mut self, queue: &wgpu::Queue, width: u32, height: u32) -> Result<(), RenderError> {
        self.viewport = ViewportParams::new(&self.settings.grid, width, height);
        queue.write_buffer(self.table.get(BufferId::Viewport)?, 0, bytemuck::bytes_of(&self.viewport));
        Ok(())
    }

    pub fn write_camera(&self, queue: &wgpu::Queue, camera: &CameraMatrices) -> Result<(), RenderError> {
        let uniform = CameraUniform::from(camera);
        queue.write_buffer(self.table.get(BufferId::Camera)?, 0, bytemuck::bytes_of(&uniform));
        Ok(())
    }

    pub fn write_render_params(&self, queue: &wgpu::Queue, params: &RenderParams) -> Result<(), RenderError> {
        let uniform = RenderUniform::new(params, self.settings.background);
        queue.write_buffer(self.table.get(BufferId::RenderParams)?, 0, bytemuck::bytes_of(&uniform));
        Ok(())
    }

    fn write_globals(&self, queue: &wgpu::Queue) {
        let globals = self.global_params();
        if let Ok(buffer) = self.table.get(BufferId::Globals) {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&globals));
        }
    }

    /// Global params describing the currently allocated buffers
    pub fn global_params(&self) -> GlobalParams {
        GlobalParams::new(
            &self.settings.grid,
            self.layout.splat_count,
            self.layout.pair_capacity,
            self.settings.max_splats_per_tile,
        )
    }

    pub fn table(&self) -> &BufferTable {
        &self.table
    }

    pub fn layout(&self) -> SceneLayout {
        self.layout
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn viewport(&self) -> ViewportParams {
        self.viewport
    }
}

fn create_zeroed(device: &wgpu::Device, id: BufferId, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
    // wgpu zero-initializes new buffers
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(id.label()),
        size: size.max(4),
        usage,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 128 << 20;

    #[test]
    fn test_empty_scene_layout_is_bindable() {
        let layout = SceneLayout::for_splat_count(0, 8, LIMIT);
        assert_eq!(layout.splat_count, 0);
        assert_eq!(layout.splat_slots(), 1);
        assert_eq!(layout.pair_capacity, SORT_BLOCK);
        assert_eq!(layout.max_sort_groups(), 1);
        assert_eq!(layout.histogram_bytes(), 1024);
    }

    #[test]
    fn test_pair_capacity_rounds_to_block() {
        let layout = SceneLayout::for_splat_count(1000, 3, LIMIT);
        assert_eq!(layout.pair_capacity, 3072);
        assert_eq!(layout.pair_capacity % SORT_BLOCK, 0);
        assert_eq!(layout.splats3d_bytes(), 64_000);
        assert_eq!(layout.splats2d_bytes(), 48_000);
    }

    #[test]
    fn test_pair_capacity_respects_binding_limit() {
        let layout = SceneLayout::for_splat_count(10_000_000, 8, LIMIT);
        assert_eq!(layout.pair_capacity, MAX_SORT_PAIRS);

        let small = SceneLayout::for_splat_count(10_000_000, 8, 1 << 20);
        assert_eq!(small.pair_capacity, (1 << 18));
        assert!(small.pair_bytes() <= 1 << 20);
    }

    #[test]
    fn test_layout_depends_only_on_count() {
        let a = SceneLayout::for_splat_count(5000, 8, LIMIT);
        let b = SceneLayout::for_splat_count(5000, 8, LIMIT);
        assert_eq!(a, b);
        assert_ne!(a, SceneLayout::for_splat_count(5001 * 2, 8, LIMIT));
    }

    #[test]
    fn test_buffer_labels_unique() {
        let ids = [
            BufferId::Camera,
            BufferId::Globals,
            BufferId::Viewport,
            BufferId::RenderParams,
            BufferId::RadixPasses,
            BufferId::Splats3D,
            BufferId::Splats2D,
            BufferId::TileCounts,
            BufferId::TileOffsets,
            BufferId::Counters,
            BufferId::SortDispatch,
            BufferId::SortKeys,
            BufferId::SortValues,
            BufferId::SortKeysScratch,
            BufferId::SortValuesScratch,
            BufferId::GroupHistogram,
            BufferId::DigitCounts,
        ];
        let labels: std::collections::HashSet<_> = ids.iter().map(|id| id.label()).collect();
        assert_eq!(labels.len(), ids.len());
    }
}
