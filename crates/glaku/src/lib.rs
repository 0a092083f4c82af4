//! glaku: a GPU resource and draw-state manager for OpenGL 3.3 / WebGL2
//! style drivers.
//!
//! A [`Context`] owns the driver and every resource created through it:
//! programs, geometries (vertex arrays plus their buffers), textures and
//! render targets. It tracks which program, geometry and render target are
//! bound and skips redundant binds.
//!
//! The driver is abstracted by [`gl::GlBackend`]; `glow::Context` implements
//! it for real rendering and [`gl::RecordingGl`] records calls for tests and
//! headless use.

pub mod gl;
pub mod logging;

mod attribute;
mod context;
mod draw;
mod error;
mod geometry;
mod program;
mod target;
mod texture;
mod uniform;

pub use attribute::{AttributeLayout, AttributeType, SlotLayout, Stride};
pub use context::{BoundCell, BoundState, Context, ContextInit, ResizeArgs};
pub use error::{Error, ResourceKind, Result};
pub use geometry::GeometryDesc;
pub use program::ProgramDesc;
pub use target::RenderTargetDesc;
pub use texture::TextureDesc;
pub use uniform::{UniformType, UniformValue, UploadShape};
