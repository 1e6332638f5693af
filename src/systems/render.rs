//! GPU rendering system
//!
//! Owns the window surface and the splat renderer:
//! - Device and surface setup, with a disabled fallback when it fails
//! - Scene uploads and per-frame camera/parameter updates
//! - Frame submission and surface error recovery
//! - On-demand frame diagnostics

use std::sync::Arc;

use splat_render::{
    CameraMatrices, RenderContext, RenderError, RenderParams, RendererSettings, SceneInput,
    SplatRenderer,
};
use winit::window::Window;

/// What to do after a failed surface acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRecovery {
    /// Reconfigure the surface and skip this frame
    Reconfigure,
    /// Skip this frame
    Skip,
    /// Stop rendering
    Fatal,
}

impl SurfaceRecovery {
    pub fn for_error(error: &wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigure,
            wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Fatal,
            _ => SurfaceRecovery::Skip,
        }
    }
}

struct ActiveRenderer {
    context: RenderContext,
    renderer: SplatRenderer,
}

/// Manages GPU rendering
///
/// If the device or pipelines cannot be created the system stays disabled
/// and every call is a no-op, so the window still opens and closes normally.
pub struct RenderSystem {
    active: Option<ActiveRenderer>,
    validate_on_inspect: bool,
}

impl RenderSystem {
    /// Create render system for `window`
    pub fn new(window: Arc<Window>, settings: RendererSettings, vsync: bool, validate_on_inspect: bool) -> Self {
        let active = match pollster::block_on(Self::init(window, settings, vsync)) {
            Ok(active) => Some(active),
            Err(e) => {
                log::error!("GPU initialisation failed, rendering disabled: {}", e);
                None
            }
        };

        Self {
            active,
            validate_on_inspect,
        }
    }

    async fn init(window: Arc<Window>, settings: RendererSettings, vsync: bool) -> Result<ActiveRenderer, RenderError> {
        let context = RenderContext::new(window, vsync).await?;
        let mut renderer = SplatRenderer::new(&context.device, context.config.format, settings)?;
        renderer.resize(&context.queue, context.config.width, context.config.height)?;
        Ok(ActiveRenderer { context, renderer })
    }

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(active) = self.active.as_mut() else { return };
        if width == 0 || height == 0 {
            return;
        }
        active.context.resize(winit::dpi::PhysicalSize::new(width, height));
        if let Err(e) = active.renderer.resize(&active.context.queue, width, height) {
            log::warn!("Viewport update failed: {}", e);
        }
    }

    /// Upload a new scene, replacing the current one
    pub fn load_scene(&mut self, scene: &SceneInput) -> Result<(), RenderError> {
        let Some(active) = self.active.as_mut() else { return Ok(()) };
        active
            .renderer
            .load_scene(&active.context.device, &active.context.queue, scene)?;
        Ok(())
    }

    pub fn set_camera(&self, camera: &CameraMatrices) {
        let Some(active) = self.active.as_ref() else { return };
        if let Err(e) = active.renderer.set_camera(&active.context.queue, camera) {
            log::warn!("Camera update failed: {}", e);
        }
    }

    pub fn set_render_params(&mut self, params: RenderParams) {
        let Some(active) = self.active.as_mut() else { return };
        if let Err(e) = active.renderer.set_render_params(&active.context.queue, params) {
            log::warn!("Render parameter update failed: {}", e);
        }
    }

    /// Current render parameters, or defaults when disabled
    pub fn render_params(&self) -> RenderParams {
        self.active
            .as_ref()
            .map(|a| a.renderer.render_params())
            .unwrap_or_default()
    }

    pub fn splat_count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.renderer.splat_count())
    }

    /// Render a single frame
    ///
    /// Lost or outdated surfaces are reconfigured and the frame is skipped.
    /// Only running out of memory is returned as an error.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        let Some(active) = self.active.as_mut() else { return Ok(()) };

        let output = match active.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                return match SurfaceRecovery::for_error(&e) {
                    SurfaceRecovery::Reconfigure => {
                        log::warn!("Surface {:?}, reconfiguring", e);
                        active.context.reconfigure();
                        Ok(())
                    }
                    SurfaceRecovery::Skip => {
                        log::warn!("Surface error: {:?}", e);
                        Ok(())
                    }
                    SurfaceRecovery::Fatal => Err(RenderError::OutOfMemory),
                };
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = active
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Splat Frame Encoder"),
            });

        active.renderer.encode_frame(&mut encoder, &view)?;

        active.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Read back the last frame and log its statistics
    ///
    /// Blocks until the GPU is idle; only call on user request.
    pub fn inspect(&self) {
        let Some(active) = self.active.as_ref() else {
            log::info!("Rendering disabled, nothing to inspect");
            return;
        };
        let (device, queue) = (&active.context.device, &active.context.queue);

        let frame = match active.renderer.read_frame(device, queue) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Frame readback failed: {}", e);
                return;
            }
        };

        let stats = frame.stats;
        log::info!(
            "Frame: {} splats, {} pairs enumerated, {} sorted, {} dropped",
            active.renderer.splat_count(),
            stats.enumerated_pairs,
            stats.sorted_pairs,
            stats.dropped_pairs
        );
        if stats.dropped_pairs > 0 {
            log::warn!(
                "Sort buffers overflowed by {} pairs; raise rendering.pairs_per_splat",
                stats.dropped_pairs
            );
        }

        if self.validate_on_inspect {
            match frame.validate() {
                Ok(()) => log::info!("Frame validation passed"),
                Err(e) => log::error!("Frame validation failed: {}", e),
            }
        }
    }

    /// Get current surface size
    pub fn size(&self) -> Option<(u32, u32)> {
        self.active
            .as_ref()
            .map(|a| (a.context.size.width, a.context.size.height))
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        self.active.as_ref().map(|a| a.context.aspect_ratio())
    }
}
