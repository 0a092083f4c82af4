//! Driver abstraction.
//!
//! The core never talks to a graphics API directly. Every imperative call it
//! issues goes through [`GlBackend`], a deliberately narrow slice of the
//! OpenGL 3.3 / WebGL2 surface. Two implementations ship with the crate:
//! - `glow::Context` (see `native`) for real rendering
//! - [`RecordingGl`] which logs calls in memory, for headless use and tests

mod native;
mod recording;

use std::fmt;

pub use recording::{Call, Failure, Handle, RecordingGl};

/// Shader pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Global render options enabled once at context construction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
    Blend,
    ScissorTest,
    StencilTest,
    RasterizerDiscard,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
}

/// Primitive assembly mode for draw calls.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Storage format of a 2D texture.
///
/// Each variant fixes the (internal format, pixel format, component type)
/// triple the driver needs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Rgba16F,
    Rgba32F,
    R32F,
    Depth24,
    Depth32F,
}

impl TextureFormat {
    #[inline]
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth24 | TextureFormat::Depth32F)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

/// Framebuffer attachment point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attachment {
    Color(u32),
    Depth,
}

/// Destination of fragment output `i` in a `draw_buffers` call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawBuffer {
    None,
    Back,
    Color(u32),
}

/// The imperative driver surface used by [`crate::Context`].
///
/// Handle kinds are associated types so that a backend can use whatever
/// native object representation it has. All calls are synchronous and assume
/// the driver context is current on the calling thread.
pub trait GlBackend {
    type Shader: Clone + fmt::Debug;
    type Program: Clone + fmt::Debug;
    type Buffer: Clone + fmt::Debug;
    type VertexArray: Clone + fmt::Debug;
    type Texture: Clone + fmt::Debug;
    type Framebuffer: Clone + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn enable(&mut self, capability: Capability);

    // ── shaders & programs ────────────────────────────────────────────────

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&mut self, shader: &Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: &Self::Shader);
    fn shader_compile_status(&mut self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&mut self, shader: &Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn delete_program(&mut self, program: Self::Program);
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    /// Declares transform-feedback outputs, one buffer per varying.
    fn transform_feedback_varyings(&mut self, program: &Self::Program, varyings: &[&str]);
    fn link_program(&mut self, program: &Self::Program);
    fn program_link_status(&mut self, program: &Self::Program) -> bool;
    fn program_info_log(&mut self, program: &Self::Program) -> String;
    fn use_program(&mut self, program: Option<&Self::Program>);

    /// Returns `None` when the attribute is not an active input of `program`.
    fn attrib_location(&mut self, program: &Self::Program, name: &str) -> Option<u32>;
    /// Returns `None` when the uniform is not active (e.g. optimized out).
    fn uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;

    // ── vertex arrays & buffers ───────────────────────────────────────────

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>);
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&Self::Buffer>);
    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: i32, data: &[u8]);

    fn enable_vertex_attrib_array(&mut self, index: u32);
    /// Describes a non-normalized float attribute sourced from the bound array buffer.
    fn vertex_attrib_pointer_f32(&mut self, index: u32, size: i32, stride: i32, offset: i32);
    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32);

    // ── uniforms ──────────────────────────────────────────────────────────

    fn uniform_1_i32(&mut self, location: &Self::UniformLocation, value: i32);
    fn uniform_1_f32(&mut self, location: &Self::UniformLocation, value: f32);
    /// `uniform{components}fv`.
    fn uniform_f32_slice(&mut self, location: &Self::UniformLocation, components: u32, values: &[f32]);
    /// `uniform{components}iv`.
    fn uniform_i32_slice(&mut self, location: &Self::UniformLocation, components: u32, values: &[i32]);
    /// `uniformMatrix{dim}fv`; `values` are column-major.
    fn uniform_matrix_f32_slice(
        &mut self,
        location: &Self::UniformLocation,
        dim: u32,
        transpose: bool,
        values: &[f32],
    );

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self) -> Result<Self::Texture, String>;
    /// Selects texture unit `unit` (0-based).
    fn active_texture(&mut self, unit: u32);
    fn bind_texture_2d(&mut self, texture: Option<&Self::Texture>);
    /// Specifies storage (and optionally contents) of the bound 2D texture.
    fn tex_image_2d(&mut self, width: i32, height: i32, format: TextureFormat, pixels: Option<&[u8]>);
    /// Sets min/mag filtering and clamp-to-edge wrapping on the bound 2D texture.
    fn tex_sampling(&mut self, filter: TextureFilter);

    // ── framebuffers & output ─────────────────────────────────────────────

    fn create_framebuffer(&mut self) -> Result<Self::Framebuffer, String>;
    fn bind_framebuffer(&mut self, framebuffer: Option<&Self::Framebuffer>);
    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: &Self::Texture);
    fn framebuffer_complete(&mut self) -> bool;
    fn draw_buffers(&mut self, buffers: &[DrawBuffer]);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>);

    // ── draws ─────────────────────────────────────────────────────────────

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32);
    /// Indexed draw with 16-bit unsigned indices.
    fn draw_elements(&mut self, mode: Primitive, count: i32, offset: i32);
    fn draw_arrays_instanced(&mut self, mode: Primitive, first: i32, count: i32, instances: i32);
    fn draw_elements_instanced(&mut self, mode: Primitive, count: i32, offset: i32, instances: i32);
}
