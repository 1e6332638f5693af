//! Splatview - Gaussian splat viewer
//!
//! Opens a window, builds a procedural splat scene and renders it through the
//! tile sort-and-composite pipeline with an orbit camera.

use std::time::Instant;

use glam::Vec3;
use splat_input::{CameraController, OrbitCamera};
use splat_render::{RenderParams, RendererSettings};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowId,
};

use splatview::config::{AppConfig, SceneConfig};
use splatview::input::{step_scale, InputAction, InputMapper};
use splatview::scene::demo_scene;
use splatview::systems::{FpsCounter, RenderSystem, WindowSystem};

/// Seconds between window title refreshes
const TITLE_INTERVAL: f32 = 0.5;

/// Main application state
struct App {
    config: AppConfig,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    camera: OrbitCamera,
    controller: CameraController,
    /// Scene settings of the currently loaded scene
    scene: SceneConfig,
    fps: FpsCounter,
    last_frame: Instant,
    title_timer: f32,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let cam = &config.camera;
        let camera = OrbitCamera::new(Vec3::ZERO, cam.start_distance)
            .with_fov(cam.fov)
            .with_clip(cam.near, cam.far)
            .with_distance_limits(cam.min_distance, cam.max_distance);

        let controller = CameraController::new()
            .with_rotate_speed(cam.rotate_speed)
            .with_pan_speed(cam.pan_speed)
            .with_zoom_speed(cam.zoom_speed);

        Self {
            scene: config.scene.clone(),
            config,
            window: None,
            render: None,
            camera,
            controller,
            fps: FpsCounter::default(),
            last_frame: Instant::now(),
            title_timer: 0.0,
        }
    }

    fn renderer_settings(&self) -> RendererSettings {
        self.config.to_renderer_settings().unwrap_or_else(|e| {
            log::warn!("{}. Using default renderer settings.", e);
            RendererSettings::default()
        })
    }

    /// Generate the current demo scene and upload it
    fn load_scene(&mut self) {
        let Some(render) = self.render.as_mut() else { return };
        let scene = demo_scene(&self.scene);
        log::info!(
            "Generated {:?} scene with {} splats (seed {})",
            self.scene.preset,
            scene.len(),
            self.scene.seed
        );
        if let Err(e) = render.load_scene(&scene) {
            log::error!("Failed to load scene: {}", e);
        }
    }

    fn handle_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::Exit => event_loop.exit(),
            InputAction::ResetCamera => {
                self.camera.reset();
                log::info!("Camera reset to starting position");
            }
            InputAction::ToggleFullscreen => {
                if let Some(window) = &self.window {
                    window.toggle_fullscreen();
                }
            }
            InputAction::TogglePoints => {
                if let Some(render) = self.render.as_mut() {
                    let mut params = render.render_params();
                    let enabled = params.toggle_show_points();
                    render.set_render_params(params);
                    log::info!("Show points: {}", if enabled { "ON" } else { "OFF" });
                }
            }
            InputAction::AdjustScale(delta) => {
                if let Some(render) = self.render.as_mut() {
                    let mut params = render.render_params();
                    params.set_scale_multiplier(step_scale(params.scale_multiplier(), delta));
                    render.set_render_params(params);
                    log::info!("Scale multiplier: {:.2}", params.scale_multiplier());
                }
            }
            InputAction::AdjustFov(delta) => {
                self.camera.set_fov_degrees(self.camera.fov_degrees() + delta);
                log::info!("Field of view: {:.0}°", self.camera.fov_degrees());
            }
            InputAction::Inspect => {
                if let Some(render) = &self.render {
                    render.inspect();
                }
            }
            InputAction::ReloadScene => {
                self.scene.seed = self.scene.seed.wrapping_add(1);
                self.load_scene();
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.controller.update(&mut self.camera, dt);
        let fps = self.fps.record(dt);

        if let Some(render) = self.render.as_mut() {
            render.set_camera(&self.camera.matrices());
            if let Err(e) = render.render_frame() {
                log::error!("Rendering stopped: {}", e);
                event_loop.exit();
                return;
            }
        }

        self.title_timer += dt;
        if let (Some(window), Some(render)) = (&self.window, &self.render) {
            if self.title_timer >= TITLE_INTERVAL {
                self.title_timer = 0.0;
                window.update_title(render.splat_count(), fps);
            }
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let mut render = RenderSystem::new(
            window.window().clone(),
            self.renderer_settings(),
            self.config.window.vsync,
            self.config.debug.validate_on_inspect,
        );
        let rendering = &self.config.rendering;
        render.set_render_params(RenderParams::new(rendering.scale_multiplier, rendering.show_points));

        if let Some(aspect) = render.aspect_ratio() {
            self.camera.set_aspect(aspect);
        }

        self.window = Some(window);
        self.render = Some(render);
        self.load_scene();
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(render) = self.render.as_mut() {
                    render.resize(physical_size.width, physical_size.height);
                }
                if physical_size.height > 0 {
                    self.camera
                        .set_aspect(physical_size.width as f32 / physical_size.height as f32);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if let Some(action) = InputMapper::map_keyboard(key, event.state) {
                        self.handle_action(action, event_loop);
                    }
                    // Pass to controller for orbit and modifier keys
                    self.controller.process_keyboard(key, event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.controller.process_mouse_button(button, state);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.controller.process_scroll(lines);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(delta.0, delta.1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = AppConfig::load();

    // RUST_LOG wins over the configured level
    let level = loaded
        .as_ref()
        .map(|c| c.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });
    log::info!("Starting Splatview");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
