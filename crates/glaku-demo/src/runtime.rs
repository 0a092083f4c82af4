use std::ffi::CString;
use std::num::NonZeroU32;

use anyhow::{anyhow, Context as _, Result};
use glaku::gl::Capability;
use glaku::{ContextInit, ResizeArgs};
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::app::{App, AppControl, FrameCtx, GlContext};
use crate::clock::FrameClock;

/// Window and GL configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub vsync: bool,
    /// Capabilities enabled on the context at startup.
    pub options: Vec<Capability>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "glaku".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            vsync: true,
            options: vec![Capability::DepthTest, Capability::CullFace],
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::<A>::new(config);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

/// Everything tied to one live window.
///
/// Field order is drop order: the app and the glaku context go before the
/// GL context and surface they render through.
struct Session<A> {
    app: A,
    gl: GlContext,
    clock: FrameClock,
    surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    session: Option<Session<A>>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            session: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_session(&self, event_loop: &ActiveEventLoop) -> Result<Session<A>> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attrs))
            .build(event_loop, template, pick_config)
            .map_err(|e| anyhow!("failed to build GL display: {e}"))?;
        let window = window.context("display builder returned no window")?;

        let raw_window_handle = window
            .window_handle()
            .context("window has no native handle")?
            .as_raw();
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("failed to create GL 3.3 core context")?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .context("failed to describe window surface")?;
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("failed to create window surface")?;

        let gl_context = not_current
            .make_current(&surface)
            .context("failed to make GL context current")?;

        if self.config.vsync {
            if let Err(e) = surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN)) {
                log::warn!("vsync unavailable: {e}");
            }
        }

        let driver = unsafe {
            glow::Context::from_loader_function(|name| match CString::new(name) {
                Ok(name) => gl_display.get_proc_address(&name),
                Err(_) => std::ptr::null(),
            })
        };

        let scale = window.scale_factor();
        let (width, height) = logical(window.inner_size(), scale);
        let init = ContextInit {
            width,
            height,
            pixel_ratio: scale as f32,
            options: self.config.options.clone(),
        };
        let mut gl = GlContext::new(driver, init);
        let app = A::init(&mut gl).context("app initialization failed")?;

        log::info!("window ready: {width}x{height} @{scale}");
        Ok(Session {
            app,
            gl,
            clock: FrameClock::default(),
            surface,
            gl_context,
            window,
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.request_exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous animation.
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.session = None;
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(size) => {
                if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                    session.surface.resize(&session.gl_context, w, h);
                }
                let (width, height) = logical(size, session.window.scale_factor());
                session
                    .app
                    .on_resize(&mut session.gl, ResizeArgs { width, height });
                session.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                session.gl.set_pixel_ratio(scale_factor as f32);
                session.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let time = session.clock.tick();
                let control = {
                    let mut frame = FrameCtx { gl: &mut session.gl, time };
                    session.app.on_frame(&mut frame)
                };

                if let Err(e) = session.surface.swap_buffers(&session.gl_context) {
                    log::error!("swap_buffers failed: {e}");
                }

                if control == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }
}

/// Picks the config with the most samples.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    // glutin reports a template with no match as a `find_configs` error, so
    // the picker only ever sees a non-empty iterator.
    configs
        .reduce(|best, config| if config.num_samples() > best.num_samples() { config } else { best })
        .expect("the platform reported no GL configs")
}

/// Physical window size to logical pixels.
fn logical(size: PhysicalSize<u32>, scale: f64) -> (u32, u32) {
    let size: LogicalSize<f64> = size.to_logical(scale);
    (size.width.round() as u32, size.height.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_divides_by_scale() {
        assert_eq!(logical(PhysicalSize::new(2560, 1440), 2.0), (1280, 720));
        assert_eq!(logical(PhysicalSize::new(301, 150), 1.5), (201, 100));
    }
}
