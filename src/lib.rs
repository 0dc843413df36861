// src/lib.rs
//! Interactive terrain viewer: a world map draped over elevation data,
//! displaced on the GPU, with map-style camera controls and a slider panel
//! for the surface material.

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod gui;
pub mod input;
pub mod material;
pub mod panel;
pub mod render_loop;
pub mod scene;
pub mod texture;
pub mod time;
pub mod viewport;

pub use config::ViewerConfig;
pub use context::{Context, OptionContext};
pub use error::{Error, Result};

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::app::AppContext;
use crate::gpu::Renderer;
use crate::render_loop::FrameLoop;
use crate::texture::AssetLoader;
use crate::viewport::ViewportSize;

/// Open the viewer window and run until it is closed.
///
/// Window, surface, adapter and device failures end the run with an error.
/// A texture that fails to load does not: the surface keeps its placeholder.
pub fn run_native() -> Result<()> {
    run_with_config(ViewerConfig::default())
}

pub fn run_with_config(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ReliefApp::new(config);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// ----------------------------------------------------------------------------
// winit 0.30 application state
// ----------------------------------------------------------------------------

struct Running {
    renderer: Renderer,
    app: AppContext,
}

struct ReliefApp {
    // taken when the window is created
    config: Option<ViewerConfig>,
    running: Option<Running>,
    frame_loop: FrameLoop,
    error: Option<Error>,
}

impl ReliefApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config: Some(config),
            running: None,
            frame_loop: FrameLoop::new(),
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop, config: ViewerConfig) -> Result<Running> {
        let attrs = Window::default_attributes().with_title(config.title.as_str());
        let window = Arc::new(event_loop.create_window(attrs)?);

        let mut renderer = pollster::block_on(Renderer::new(window.clone(), config.clear_color))?;
        let loader = AssetLoader::new(renderer.max_texture_dimension());

        let viewport = ViewportSize::from_physical(window.inner_size(), window.scale_factor());
        let mut app = AppContext::new(config, &loader, viewport)?;
        app.resize(&mut renderer, viewport);
        renderer.attach_scene(&app)?;

        self.frame_loop.start(window.as_ref());
        Ok(Running { renderer, app })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{}", err);
        self.error = Some(err);
        self.frame_loop.stop();
        event_loop.exit();
    }
}

impl ApplicationHandler for ReliefApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        let Some(config) = self.config.take() else {
            return;
        };
        match self.start(event_loop, config) {
            Ok(running) => self.running = Some(running),
            Err(err) => self.fail(event_loop, err.context("starting viewer")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else { return };
        let window = running.renderer.window().clone();
        if window.id() != window_id {
            return;
        }

        let consumed = running.renderer.handle_gui_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.frame_loop.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running
                    .app
                    .resize_physical(&mut running.renderer, size, window.scale_factor());
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // the physical size may stay put, so no Resized would follow
                log::debug!("Scale factor changed: {}", scale_factor);
                running
                    .app
                    .resize_physical(&mut running.renderer, window.inner_size(), scale_factor);
            }
            WindowEvent::RedrawRequested => {
                let ticked = self
                    .frame_loop
                    .tick(&mut running.app, &mut running.renderer, window.as_ref());
                if let Err(err) = ticked {
                    self.fail(event_loop, err);
                }
            }
            other => {
                if !consumed {
                    running.app.handle_input(&other, window.scale_factor());
                }
            }
        }
    }
}
