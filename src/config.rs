//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`SPLAT_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use splat_render::{RendererSettings, TileGrid};
use std::path::Path;
use thiserror::Error;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Demo scene configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`SPLAT_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // SPLAT_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("SPLAT_").split("__"));

        Ok(figment.extract()?)
    }

    /// Renderer settings from the rendering section
    ///
    /// Fails if the tile grid is not a power-of-two grid within the key budget.
    pub fn to_renderer_settings(&self) -> Result<RendererSettings, ConfigError> {
        let r = &self.rendering;
        let grid = TileGrid::new(r.grid_x, r.grid_y).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if r.pairs_per_splat == 0 {
            return Err(ConfigError::Invalid("rendering.pairs_per_splat must be at least 1".into()));
        }
        Ok(RendererSettings {
            grid,
            max_splats_per_tile: r.max_splats_per_tile.max(1),
            pairs_per_splat: r.pairs_per_splat,
            background: r.background_color,
        })
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Splatview".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Orbit camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Starting distance from the orbit target
    pub start_distance: f32,
    /// Drag rotation speed in radians per pixel
    pub rotate_speed: f32,
    /// Pan speed in target distances per pixel
    pub pan_speed: f32,
    /// Zoom speed per wheel line
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 0.01,
            far: 50.0,
            start_distance: 3.0,
            rotate_speed: 0.005,
            pan_speed: 0.002,
            zoom_speed: 0.1,
            min_distance: 0.1,
            max_distance: 50.0,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Tile grid columns (power of two)
    pub grid_x: u32,
    /// Tile grid rows (power of two)
    pub grid_y: u32,
    /// Most splats composited per tile, nearest first
    pub max_splats_per_tile: u32,
    /// Sort buffer budget per splat
    pub pairs_per_splat: u32,
    /// Background color [r, g, b, a]
    pub background_color: [f32; 4],
    /// Initial splat scale multiplier, 0..=1
    pub scale_multiplier: f32,
    /// Start with splat centres drawn as points
    pub show_points: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            grid_x: 32,
            grid_y: 32,
            max_splats_per_tile: 1 << 15,
            pairs_per_splat: 8,
            background_color: [0.0, 0.0, 0.0, 1.0],
            scale_multiplier: 1.0,
            show_points: false,
        }
    }
}

/// Procedural scene presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePreset {
    /// Sphere shell over a ground grid
    Showcase,
    /// Uniform random cloud
    Cloud,
    Empty,
}

/// Demo scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub preset: ScenePreset,
    /// Splats generated by the preset
    pub splat_count: u32,
    /// Seed for random placement
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            preset: ScenePreset::Showcase,
            splat_count: 50_000,
            seed: 1,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Run frame validation when diagnostics are requested
    pub validate_on_inspect: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            validate_on_inspect: true,
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}
