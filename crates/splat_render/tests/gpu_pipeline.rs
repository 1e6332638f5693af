//! Integration tests for the GPU splat pipeline
//!
//! These tests run the real compute and render stages on a headless device:
//! 1. The radix sort orders arbitrary pairs stably
//! 2. Tiling and sorting produce consistent, depth-ordered tile lists
//! 3. Compositing yields the background for an empty scene and the
//!    front-to-back blend of the projected splats otherwise
//! 4. Degenerate, non-finite and behind-camera splats are culled or clamped
//! 5. Reloading a scene rebinds every stage to the new buffers
//!
//! Each test is skipped (with a note on stderr) when no adapter is available.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splat_render::{
    context::GpuContext, CameraMatrices, GpuSplat2D, RenderParams, RendererSettings, SceneInput,
    SplatRenderer, TileGrid,
};
use glam::{Mat4, Vec3};

const SIZE: u32 = 64;

fn gpu() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::headless()) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn isotropic(variance: f32) -> [f32; 6] {
    [variance, 0.0, 0.0, variance, 0.0, variance]
}

/// Camera at the origin looking down -Z with a square viewport
fn camera() -> CameraMatrices {
    CameraMatrices::new(
        Mat4::IDENTITY,
        Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.01, 50.0),
    )
}

/// Random splats inside the view frustum
fn cloud(count: usize, seed: u64) -> SceneInput {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = SceneInput::with_capacity(count);
    for _ in 0..count {
        let z = -rng.random_range(2.0..10.0f32);
        let half = -z * 0.5;
        let position = Vec3::new(rng.random_range(-half..half), rng.random_range(-half..half), z);
        let color = Vec3::new(rng.random(), rng.random(), rng.random());
        scene.push(position, isotropic(rng.random_range(0.0005..0.01)), color, rng.random_range(0.2..1.0));
    }
    scene
}

/// Coarser grid and a generous pair budget so cloud scenes never overflow
fn roomy() -> RendererSettings {
    RendererSettings {
        grid: TileGrid::new(16, 16).unwrap(),
        pairs_per_splat: 32,
        ..Default::default()
    }
}

fn renderer(ctx: &GpuContext, settings: RendererSettings) -> SplatRenderer {
    let mut renderer = SplatRenderer::new(&ctx.device, wgpu::TextureFormat::Rgba8Unorm, settings).unwrap();
    renderer.resize(&ctx.queue, SIZE, SIZE).unwrap();
    renderer.set_camera(&ctx.queue, &camera()).unwrap();
    renderer
}

fn render_target(ctx: &GpuContext) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Target"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn render(ctx: &GpuContext, renderer: &SplatRenderer, target: &wgpu::Texture) {
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Frame"),
    });
    renderer.encode_frame(&mut encoder, &view).unwrap();
    ctx.queue.submit(std::iter::once(encoder.finish()));
}

/// RGBA8 pixels of a SIZE x SIZE target; one row is exactly 256 bytes
fn read_pixels(ctx: &GpuContext, target: &wgpu::Texture) -> Vec<u8> {
    let bytes = (SIZE * SIZE * 4) as u64;
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Pixel Staging"),
        size: bytes,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        target.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SIZE * 4),
                rows_per_image: Some(SIZE),
            },
        },
        target.size(),
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    rx.recv().unwrap().unwrap();
    let pixels = slice.get_mapped_range().to_vec();
    staging.unmap();
    pixels
}

/// Front-to-back blend at the centre of pixel (x, y) over a black background,
/// mirroring composite.wgsl for a single-tile grid
fn blend_at(projected: &[GpuSplat2D], x: u32, y: u32) -> [f32; 3] {
    let mut order: Vec<&GpuSplat2D> = projected.iter().filter(|s| !s.is_culled()).collect();
    order.sort_by(|a, b| a.depth.total_cmp(&b.depth));

    let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
    let mut color = [0.0f32; 3];
    let mut transmittance = 1.0f32;
    for splat in order {
        let dx = px - splat.screen[0];
        let dy = py - splat.screen[1];
        let [a, b, c] = splat.conic;
        let power = -0.5 * (a * dx * dx + c * dy * dy) - b * dx * dy;
        if power > 0.0 {
            continue;
        }
        let alpha = (splat.opacity * power.exp()).min(0.99);
        if alpha < 1.0 / 255.0 {
            continue;
        }
        for (out, channel) in color.iter_mut().zip(splat.color) {
            *out += channel * alpha * transmittance;
        }
        transmittance *= 1.0 - alpha;
        if transmittance < 1e-4 {
            break;
        }
    }
    color
}

fn single_tile() -> RendererSettings {
    RendererSettings {
        grid: TileGrid::new(1, 1).unwrap(),
        ..Default::default()
    }
}

fn assert_finite_projection(splat: &GpuSplat2D) {
    assert!(splat.conic.iter().all(|v| v.is_finite()), "conic {:?}", splat.conic);
    assert!(splat.extent.iter().all(|v| v.is_finite() && *v > 0.0), "extent {:?}", splat.extent);
}

// ==================== Sort Tests ====================

#[test]
fn test_radix_sort_matches_stable_sort() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, RendererSettings::default());
    // 2000 splats x 8 pairs gives room for 10k pairs
    renderer.load_scene(&ctx.device, &ctx.queue, &cloud(2000, 1)).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    // Narrow key range forces plenty of duplicates
    let keys: Vec<u32> = (0..10_000).map(|_| rng.random_range(0..4096u32) << 12).collect();
    let values: Vec<u32> = (0..10_000).collect();

    let mut expected: Vec<(u32, u32)> = keys.iter().copied().zip(values.iter().copied()).collect();
    expected.sort_by_key(|(k, _)| *k);

    let (sorted_keys, sorted_values) = renderer.run_sort_only(&ctx.device, &ctx.queue, &keys, &values).unwrap();
    let actual: Vec<(u32, u32)> = sorted_keys.into_iter().zip(sorted_values).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_sort_rejects_too_many_pairs() {
    let Some(ctx) = gpu() else { return };
    let renderer = renderer(&ctx, RendererSettings::default());
    let capacity = renderer.layout().pair_capacity as usize;
    let keys = vec![0u32; capacity + 1];
    assert!(renderer.run_sort_only(&ctx.device, &ctx.queue, &keys, &keys).is_err());
}

// ==================== Frame Tests ====================

#[test]
fn test_single_tile_orders_by_depth() {
    let Some(ctx) = gpu() else { return };
    let settings = RendererSettings {
        grid: TileGrid::new(1, 1).unwrap(),
        ..Default::default()
    };
    let mut renderer = renderer(&ctx, settings);

    let mut scene = SceneInput::empty();
    for z in [-5.0, -1.0, -3.0] {
        scene.push(Vec3::new(0.0, 0.0, z), isotropic(0.01), Vec3::ONE, 0.8);
    }
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    assert_eq!(frame.stats.sorted_pairs, 3);
    assert_eq!(frame.tile_slice(0), &[1, 2, 0]);
}

#[test]
fn test_composite_matches_front_to_back_blend() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, single_tile());

    let mut scene = SceneInput::empty();
    // Pushed back to front so sorting has work to do
    scene.push(Vec3::new(0.1, 0.0, -5.0), isotropic(0.02), Vec3::new(0.0, 1.0, 0.0), 0.9);
    scene.push(Vec3::new(-0.05, 0.05, -3.0), isotropic(0.004), Vec3::new(1.0, 0.5, 0.25), 0.6);
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    assert_eq!(frame.tile_slice(0), &[1, 0]);

    let pixels = read_pixels(&ctx, &target);
    let mut lit = 0;
    for y in 0..SIZE {
        for x in 0..SIZE {
            let i = ((y * SIZE + x) * 4) as usize;
            let expected = blend_at(&frame.projected, x, y);
            for channel in 0..3 {
                let want = (expected[channel].clamp(0.0, 1.0) * 255.0).round() as i32;
                let got = pixels[i + channel] as i32;
                assert!((want - got).abs() <= 2, "pixel ({x}, {y}) channel {channel}: {got} != {want}");
            }
            assert_eq!(pixels[i + 3], 255);
            if expected.iter().any(|c| *c > 0.1) {
                lit += 1;
            }
        }
    }
    assert!(lit > 0);
}

#[test]
fn test_empty_scene_shows_background() {
    let Some(ctx) = gpu() else { return };
    let settings = RendererSettings {
        background: [0.0, 0.0, 1.0, 1.0],
        ..Default::default()
    };
    let renderer = renderer(&ctx, settings);
    assert_eq!(renderer.splat_count(), 0);

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let pixels = read_pixels(&ctx, &target);
    for px in pixels.chunks_exact(4) {
        assert_eq!(px, &[0, 0, 255, 255]);
    }

    let stats = renderer.read_stats(&ctx.device, &ctx.queue).unwrap();
    assert_eq!(stats.enumerated_pairs, 0);
}

#[test]
fn test_cloud_frame_is_consistent() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, roomy());
    renderer.load_scene(&ctx.device, &ctx.queue, &cloud(5000, 7)).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    assert!(frame.stats.sorted_pairs > 0);
    assert_eq!(frame.stats.dropped_pairs, 0);
}

#[test]
fn test_overflow_drops_pairs_consistently() {
    let Some(ctx) = gpu() else { return };
    let settings = RendererSettings {
        pairs_per_splat: 1,
        ..Default::default()
    };
    let mut renderer = renderer(&ctx, settings);

    // Large splats cover many tiles each
    let mut scene = SceneInput::empty();
    for i in 0..2000 {
        let z = -2.0 - (i as f32) * 0.001;
        scene.push(Vec3::new(0.0, 0.0, z), isotropic(0.05), Vec3::ONE, 0.5);
    }
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    assert!(frame.stats.dropped_pairs > 0);
    assert_eq!(frame.stats.sorted_pairs, renderer.layout().pair_capacity);
    frame.validate().unwrap();
}

// ==================== Culling Tests ====================

#[test]
fn test_splats_behind_camera_are_culled() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, single_tile());

    let mut scene = SceneInput::empty();
    scene.push(Vec3::new(0.0, 0.0, 3.0), isotropic(0.01), Vec3::ONE, 1.0);
    // Inside the near plane
    scene.push(Vec3::new(0.0, 0.0, -0.005), isotropic(0.01), Vec3::ONE, 1.0);
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    assert_eq!(frame.stats.enumerated_pairs, 0);
    assert!(frame.projected.iter().all(|s| s.is_culled()));

    let pixels = read_pixels(&ctx, &target);
    for px in pixels.chunks_exact(4) {
        assert_eq!(px, &[0, 0, 0, 255]);
    }
}

#[test]
fn test_degenerate_covariance_is_clamped() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, single_tile());

    let mut scene = SceneInput::empty();
    let center = Vec3::new(0.0, 0.0, -4.0);
    scene.push(center, [0.0; 6], Vec3::ONE, 0.8);
    // Indefinite: negative variance along y
    scene.push(center, [1.0, 0.0, 0.0, -1.0, 0.0, 1.0], Vec3::ONE, 0.8);
    scene.push(center, [f32::NAN, 0.0, 0.0, 1.0, 0.0, 1.0], Vec3::ONE, 0.8);
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    for splat in &frame.projected[..2] {
        assert!(!splat.is_culled());
        assert_finite_projection(splat);
    }
    assert!(frame.projected[2].is_culled());
}

#[test]
fn test_non_finite_attributes_are_culled() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, single_tile());

    let mut scene = SceneInput::empty();
    let center = Vec3::new(0.0, 0.0, -4.0);
    scene.push(center, isotropic(0.01), Vec3::new(0.2, 0.4, 0.6), 0.7);
    scene.push(center, isotropic(0.01), Vec3::ONE, f32::NAN);
    scene.push(center, isotropic(0.01), Vec3::new(f32::INFINITY, 0.0, 0.0), 0.7);
    scene.push(Vec3::new(f32::NAN, 0.0, -4.0), isotropic(0.01), Vec3::ONE, 0.7);
    scene.push(center, isotropic(0.01), Vec3::ONE, f32::INFINITY);
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    assert!(!frame.projected[0].is_culled());
    for (i, splat) in frame.projected.iter().enumerate().skip(1) {
        assert!(splat.is_culled(), "splat {i} should be culled");
        assert_eq!(*splat, GpuSplat2D { depth: splat.depth, ..Default::default() });
    }
    assert_eq!(frame.tile_slice(0), &[0]);

    // Only the valid splat reaches the image
    let pixels = read_pixels(&ctx, &target);
    let (x, y) = (SIZE / 2, SIZE / 2);
    let i = ((y * SIZE + x) * 4) as usize;
    let expected = blend_at(&frame.projected[..1], x, y);
    for channel in 0..3 {
        let want = (expected[channel] * 255.0).round() as i32;
        assert!((pixels[i + channel] as i32 - want).abs() <= 2);
    }
}

#[test]
fn test_zero_scale_multiplier_leaves_blur_footprint() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, single_tile());

    let mut scene = SceneInput::empty();
    scene.push(Vec3::new(0.0, 0.0, -4.0), isotropic(0.05), Vec3::ONE, 0.9);
    renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();
    renderer.set_render_params(&ctx.queue, RenderParams::new(0.0, false)).unwrap();

    let target = render_target(&ctx);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    frame.validate().unwrap();
    let splat = frame.projected[0];
    assert!(!splat.is_culled());
    assert_finite_projection(&splat);

    // Only the 0.3 px^2 low-pass remains
    let blur_extent = 3.0 * 0.3f32.sqrt();
    for e in splat.extent {
        assert!((e - blur_extent).abs() < 1e-3, "extent {e}");
    }
    assert!((splat.conic[0] - 1.0 / 0.3).abs() < 1e-2);
    assert!(splat.conic[1].abs() < 1e-6);
}

// ==================== Lifecycle Tests ====================

#[test]
fn test_reload_is_idempotent() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, roomy());
    let scene = cloud(3000, 11);
    let target = render_target(&ctx);

    let first_layout = renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();
    render(&ctx, &renderer, &target);
    let first = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();

    let second_layout = renderer.load_scene(&ctx.device, &ctx.queue, &scene).unwrap();
    render(&ctx, &renderer, &target);
    let second = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();

    assert_eq!(first_layout, second_layout);
    assert_eq!(first.stats, second.stats);
    assert_eq!(first.tile_counts, second.tile_counts);
    assert_eq!(first.tile_offsets, second.tile_offsets);
    assert_eq!(first.keys, second.keys);
    assert_eq!(first.projected, second.projected);
    second.validate().unwrap();
}

#[test]
fn test_switching_scene_size_rebinds() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = renderer(&ctx, roomy());
    let target = render_target(&ctx);

    renderer.load_scene(&ctx.device, &ctx.queue, &cloud(4000, 3)).unwrap();
    render(&ctx, &renderer, &target);

    renderer.load_scene(&ctx.device, &ctx.queue, &cloud(100, 4)).unwrap();
    assert_eq!(renderer.splat_count(), 100);
    render(&ctx, &renderer, &target);

    let frame = renderer.read_frame(&ctx.device, &ctx.queue).unwrap();
    assert_eq!(frame.projected.len(), 100);
    frame.validate().unwrap();
}
