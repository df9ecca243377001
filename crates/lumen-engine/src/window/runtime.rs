use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction, SurfaceFrame, WindowSurface};
use crate::gl::{GlContext, Viewport};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs until it is closed or the app exits.
    ///
    /// `factory` builds the app once the window, device and context exist, so
    /// the app can compile shaders and upload resources on the context it is
    /// handed. An error from `factory` ends the loop and is returned here.
    pub fn run<A, F>(config: RuntimeConfig, gpu_init: GpuInit, factory: F) -> Result<()>
    where
        A: App + 'static,
        F: FnOnce(&Rc<GlContext>) -> Result<A> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, factory);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Everything that exists once the window is up.
struct Running<A> {
    app: A,
    gl: Rc<GlContext>,
    surface: WindowSurface,
    clock: FrameClock,
}

struct AppState<A, F> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    factory: Option<F>,
    running: Option<Running<A>>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A, F> AppState<A, F>
where
    A: App + 'static,
    F: FnOnce(&Rc<GlContext>) -> Result<A> + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, factory: F) -> Self {
        Self {
            config,
            gpu_init,
            factory: Some(factory),
            running: None,
            error: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let (gpu, surface) = pollster::block_on(Gpu::new(window, self.gpu_init.clone()))
            .context("GPU initialization failed")?;

        let gl = Rc::new(GlContext::new(gpu));
        let size = surface.size();
        gl.set_viewport(Some(Viewport::full(size.width, size.height)));

        let factory = self
            .factory
            .take()
            .context("application was already started")?;
        let app = factory(&gl).context("failed to start application")?;

        surface.window().request_redraw();
        self.running = Some(Running {
            app,
            gl,
            surface,
            clock: FrameClock::new(),
        });
        Ok(())
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(running) = self.running.as_mut() else { return };

        running.surface.resize(running.gl.gpu(), new_size);
        // Same as a framebuffer-size callback: the viewport follows the window.
        running
            .gl
            .set_viewport(Some(Viewport::full(new_size.width, new_size.height)));
        running.surface.window().request_redraw();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else { return };

        let SurfaceFrame {
            surface_texture,
            target,
        } = match running.surface.acquire(running.gl.gpu()) {
            Ok(frame) => frame,
            Err(SurfaceErrorAction::Fatal) => {
                log::error!("surface lost irrecoverably; exiting");
                self.request_exit(event_loop);
                return;
            }
            Err(_) => return,
        };

        let time = running.clock.tick();
        running.gl.begin_frame(target);

        let control = {
            let mut ctx = FrameCtx {
                gl: &running.gl,
                window: running.surface.window(),
                size: running.surface.size(),
                time,
            };
            running.app.on_frame(&mut ctx)
        };

        running.gl.end_frame();
        running.surface.present(surface_texture);

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A, F> ApplicationHandler for AppState<A, F>
where
    A: App + 'static,
    F: FnOnce(&Rc<GlContext>) -> Result<A> + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.exit_requested {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            log::error!("failed to start: {err:#}");
            self.error = Some(err);
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the scene animates every frame.
        if let Some(running) = &self.running {
            running.surface.window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if let Some(running) = self.running.as_mut() {
            if running.app.on_window_event(&event) == AppControl::Exit {
                self.request_exit(event_loop);
                return;
            }
        }

        match &event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed
                    && key.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => self.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.running.as_ref().map(|r| r.surface.window().inner_size()) {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release app resources while the device is still alive.
        self.running = None;
    }
}
