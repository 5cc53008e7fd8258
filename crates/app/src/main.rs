//! Prism demo application.
//!
//! Drives the renderer through winit's `ApplicationHandler`: creates the
//! window and renderer on resume, forwards input and resize events, and
//! renders the configured demo every redraw.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use prism_core::{AppConfig, Demo, Timer};
use prism_platform::{InputState, MouseButton, Window};
use prism_renderer::{
    FrameError, Renderer, RendererOptions, SphereRenderer, TriangleRenderer,
};
use prism_scene::{Camera, OrbitController};

/// Config file looked up next to the working directory.
const CONFIG_PATH: &str = "prism.toml";

enum DemoRenderer {
    Triangle(TriangleRenderer),
    Sphere(SphereRenderer),
}

struct App {
    config: AppConfig,
    window: Option<Window>,
    renderer: Option<Renderer>,
    demo: Option<DemoRenderer>,
    input: InputState,
    timer: Timer,
    camera: Camera,
    orbit: OrbitController,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let mut camera = Camera::new();
        camera.set_perspective(
            45.0_f32.to_radians(),
            config.window.width as f32 / config.window.height.max(1) as f32,
            0.1,
            100.0,
        );

        Self {
            config,
            window: None,
            renderer: None,
            demo: None,
            input: InputState::new(),
            timer: Timer::new(),
            camera,
            orbit: OrbitController::default(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(
            event_loop,
            self.config.window.width,
            self.config.window.height,
            &self.config.window.title,
        )?;

        let options = RendererOptions {
            app_name: self.config.window.title.clone(),
            validation: self.config.validation,
            vsync: self.config.vsync,
            frame_timeout: Duration::from_millis(self.config.frame_timeout_ms),
            ..RendererOptions::default()
        };
        let renderer = Renderer::new(&window, &options)?;

        let demo = match self.config.demo {
            Demo::Triangle => DemoRenderer::Triangle(TriangleRenderer::new(&renderer)?),
            Demo::Sphere => DemoRenderer::Sphere(SphereRenderer::new(&renderer)?),
        };

        info!("Initialization complete, entering main loop");
        self.renderer = Some(renderer);
        self.window = Some(window);
        self.demo = Some(demo);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let delta = self.timer.delta_secs();

        let (Some(renderer), Some(demo)) = (self.renderer.as_mut(), self.demo.as_mut()) else {
            return;
        };

        // Orbit with the left mouse button, zoom with the wheel.
        if self.input.is_mouse_pressed(MouseButton::Left)
            && !self.input.is_mouse_just_pressed(MouseButton::Left)
        {
            let (dx, dy) = self.input.mouse_delta();
            self.orbit.orbit(dx, dy);
        }
        let scroll = self.input.scroll_delta();
        if scroll != 0.0 {
            self.orbit.zoom(scroll);
        }
        self.orbit.apply(&mut self.camera);

        if let DemoRenderer::Sphere(sphere) = demo {
            sphere.update(delta);
        }

        let camera = &self.camera;
        let mut record_result = Ok(());
        let frame_result = renderer.render_frame(|ctx| match demo {
            DemoRenderer::Triangle(triangle) => triangle.record(ctx),
            DemoRenderer::Sphere(sphere) => {
                record_result = sphere.record(ctx, camera);
            }
        });

        match frame_result {
            Ok(_) => {}
            Err(FrameError::SlotTimeout { slot, timeout }) => {
                error!(
                    "GPU stopped responding (slot {} exceeded {:?}), shutting down",
                    slot, timeout
                );
                event_loop.exit();
            }
            Err(e) => {
                error!("Fatal render error: {:?}", e);
                event_loop.exit();
            }
        }
        if let Err(e) = record_result {
            error!("Uniform upload failed: {:?}", e);
            event_loop.exit();
        }

        self.input.begin_frame();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            error!("Failed to initialize: {:?}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = self.window.as_mut() {
                    window.resize(size.width, size.height);
                }
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
                if size.height > 0 {
                    self.camera
                        .set_aspect(size.width as f32 / size.height as f32);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::PhysicalKey;
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = MouseButton::from(button);
                match state {
                    ElementState::Pressed => self.input.on_mouse_pressed(button),
                    ElementState::Released => self.input.on_mouse_released(button),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .on_mouse_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                self.input.on_scroll(steps);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    prism_core::init_logging();

    let config = match AppConfig::load_or_default(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load {}: {}, using defaults", CONFIG_PATH, e);
            AppConfig::default()
        }
    };
    info!("Starting Prism ({:?} demo)", config.demo);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
