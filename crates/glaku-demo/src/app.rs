use anyhow::Result;
use glaku::ResizeArgs;
use winit::event::WindowEvent;

use crate::clock::FrameTime;

/// The context type the demo renders with.
pub type GlContext = glaku::Context<glow::Context>;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-frame context passed to [`App::on_frame`].
pub struct FrameCtx<'a> {
    pub gl: &'a mut GlContext,
    pub time: FrameTime,
}

/// Application contract driven by the runtime.
pub trait App: Sized {
    /// Builds the app once the GL context is current.
    fn init(gl: &mut GlContext) -> Result<Self>;

    /// Surface resize notification, in logical pixels.
    fn on_resize(&mut self, gl: &mut GlContext, args: ResizeArgs) {
        gl.resize(args);
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per presented frame.
    fn on_frame(&mut self, frame: &mut FrameCtx<'_>) -> AppControl;
}
