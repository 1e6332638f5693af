//! Window management system
//!
//! Handles window creation, fullscreen toggle, and title updates.

use std::sync::Arc;
use thiserror::Error;
use winit::{
    event_loop::ActiveEventLoop,
    window::{Fullscreen, Window},
};
use crate::config::WindowConfig;

/// Weight of the previous estimate in the smoothed frame rate
const FPS_SMOOTHING: f32 = 0.6;

/// Exponentially smoothed frames-per-second estimate
#[derive(Debug, Clone, Copy, Default)]
pub struct FpsCounter {
    fps: Option<f32>,
}

impl FpsCounter {
    /// Feed one frame time in seconds; returns the smoothed rate
    pub fn record(&mut self, dt: f32) -> f32 {
        if dt > 0.0 && dt.is_finite() {
            let instant = 1.0 / dt;
            self.fps = Some(match self.fps {
                Some(old) => FPS_SMOOTHING * old + (1.0 - FPS_SMOOTHING) * instant,
                None => instant,
            });
        }
        self.fps()
    }

    pub fn fps(&self) -> f32 {
        self.fps.unwrap_or(0.0)
    }
}

/// Manages the application window
pub struct WindowSystem {
    window: Arc<Window>,
    base_title: String,
}

impl WindowSystem {
    /// Create window from config
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<Self, WindowError> {
        let mut attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.width,
                config.height,
            ));

        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| WindowError::CreationFailed(e.to_string()))?,
        );

        Ok(Self {
            window,
            base_title: config.title.clone(),
        })
    }

    /// Get window reference (for RenderContext creation)
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&self) {
        let new_fullscreen = if self.window.fullscreen().is_some() {
            None
        } else {
            Some(Fullscreen::Borderless(None))
        };
        self.window.set_fullscreen(new_fullscreen);
    }

    /// Update window title with splat count and frame rate
    pub fn update_title(&self, splat_count: u32, fps: f32) {
        self.window.set_title(&format_title(&self.base_title, splat_count, fps));
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Frame time in milliseconds for a smoothed FPS; zero before the first sample
fn frame_ms(fps: f32) -> f32 {
    if fps > 0.0 {
        1000.0 / fps
    } else {
        0.0
    }
}

fn format_title(base: &str, splat_count: u32, fps: f32) -> String {
    format!(
        "{} - {} splats - {:.0} FPS ({:.2} ms)",
        base,
        splat_count,
        fps,
        frame_ms(fps)
    )
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Window creation failed: {0}")]
    CreationFailed(String),
}
