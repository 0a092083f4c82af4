use std::collections::{HashMap, HashSet};

use super::{
    Attachment, BufferTarget, BufferUsage, Capability, DrawBuffer, GlBackend, Primitive,
    ShaderStage, TextureFilter, TextureFormat,
};

/// Opaque object name handed out by [`RecordingGl`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

/// Driver-level failure that [`RecordingGl`] can be told to simulate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Failure {
    /// Compilation of the given stage reports failure with this log.
    Compile(ShaderStage, String),
    /// Linking reports failure with this log.
    Link(String),
    /// Every `create_*` call returns an error.
    Allocation,
    /// The next `n` `create_*` calls succeed, every later one fails.
    AllocationAfter(u32),
}

/// One recorded driver call.
///
/// Uniform calls carry the uniform *name* as their location so assertions
/// stay readable.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Enable(Capability),
    CreateShader(ShaderStage, Handle),
    ShaderSource(Handle, String),
    CompileShader(Handle),
    DeleteShader(Handle),
    CreateProgram(Handle),
    DeleteProgram(Handle),
    AttachShader(Handle, Handle),
    TransformFeedbackVaryings(Handle, Vec<String>),
    LinkProgram(Handle),
    UseProgram(Option<Handle>),
    AttribLocation(Handle, String),
    UniformLocation(Handle, String),
    CreateVertexArray(Handle),
    BindVertexArray(Option<Handle>),
    DeleteVertexArray(Handle),
    CreateBuffer(Handle),
    BindBuffer(BufferTarget, Option<Handle>),
    DeleteBuffer(Handle),
    BufferData { target: BufferTarget, len: usize, usage: BufferUsage },
    BufferSubData { target: BufferTarget, offset: i32, len: usize },
    EnableVertexAttribArray(u32),
    VertexAttribPointer { index: u32, size: i32, stride: i32, offset: i32 },
    VertexAttribDivisor { index: u32, divisor: u32 },
    Uniform1i(String, i32),
    Uniform1f(String, f32),
    UniformFloatVec { location: String, components: u32, values: Vec<f32> },
    UniformIntVec { location: String, components: u32, values: Vec<i32> },
    UniformMatrix { location: String, dim: u32, transpose: bool, values: Vec<f32> },
    CreateTexture(Handle),
    ActiveTexture(u32),
    BindTexture2d(Option<Handle>),
    TexImage2d { width: i32, height: i32, format: TextureFormat },
    TexSampling(TextureFilter),
    CreateFramebuffer(Handle),
    BindFramebuffer(Option<Handle>),
    FramebufferTexture2d(Attachment, Handle),
    DrawBuffers(Vec<DrawBuffer>),
    Viewport(i32, i32, i32, i32),
    Clear { color: Option<[f32; 4]>, depth: Option<f32> },
    DrawArrays { mode: Primitive, first: i32, count: i32 },
    DrawElements { mode: Primitive, count: i32, offset: i32 },
    DrawArraysInstanced { mode: Primitive, first: i32, count: i32, instances: i32 },
    DrawElementsInstanced { mode: Primitive, count: i32, offset: i32, instances: i32 },
}

/// In-memory driver that records every call instead of rendering.
///
/// Attribute locations come from an explicit table ([`with_attribute`]);
/// names absent from the table are assigned `4 * n` in query order so that
/// matrix attributes never overlap. Uniforms are active unless marked with
/// [`with_inactive_uniform`].
///
/// [`with_attribute`]: RecordingGl::with_attribute
/// [`with_inactive_uniform`]: RecordingGl::with_inactive_uniform
#[derive(Debug, Default)]
pub struct RecordingGl {
    calls: Vec<Call>,
    next_handle: u32,

    attributes: HashMap<String, Option<u32>>,
    next_auto_location: u32,
    inactive_uniforms: HashSet<String>,

    shader_stages: HashMap<Handle, ShaderStage>,
    failure: Option<Failure>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the location reported for attribute `name`.
    pub fn with_attribute(mut self, name: &str, location: u32) -> Self {
        self.attributes.insert(name.to_string(), Some(location));
        self
    }

    /// Reports attribute `name` as inactive in every program.
    pub fn with_inactive_attribute(mut self, name: &str) -> Self {
        self.attributes.insert(name.to_string(), None);
        self
    }

    /// Reports uniform `name` as inactive in every program.
    pub fn with_inactive_uniform(mut self, name: &str) -> Self {
        self.inactive_uniforms.insert(name.to_string());
        self
    }

    pub fn fail_with(&mut self, failure: Failure) {
        self.failure = Some(failure);
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    /// All calls recorded so far, in issue order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Forgets recorded calls; handle numbering and tables are kept.
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Counts recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn allocate(&mut self) -> Result<Handle, String> {
        match &mut self.failure {
            Some(Failure::Allocation) | Some(Failure::AllocationAfter(0)) => {
                return Err("out of handles".to_string());
            }
            Some(Failure::AllocationAfter(n)) => *n -= 1,
            _ => {}
        }
        self.next_handle += 1;
        Ok(Handle(self.next_handle))
    }
}

impl GlBackend for RecordingGl {
    type Shader = Handle;
    type Program = Handle;
    type Buffer = Handle;
    type VertexArray = Handle;
    type Texture = Handle;
    type Framebuffer = Handle;
    type UniformLocation = String;

    fn enable(&mut self, capability: Capability) {
        self.calls.push(Call::Enable(capability));
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Handle, String> {
        let h = self.allocate()?;
        self.shader_stages.insert(h, stage);
        self.calls.push(Call::CreateShader(stage, h));
        Ok(h)
    }

    fn shader_source(&mut self, shader: &Handle, source: &str) {
        self.calls.push(Call::ShaderSource(*shader, source.to_string()));
    }

    fn compile_shader(&mut self, shader: &Handle) {
        self.calls.push(Call::CompileShader(*shader));
    }

    fn shader_compile_status(&mut self, shader: &Handle) -> bool {
        match (&self.failure, self.shader_stages.get(shader)) {
            (Some(Failure::Compile(stage, _)), Some(s)) => stage != s,
            _ => true,
        }
    }

    fn shader_info_log(&mut self, shader: &Handle) -> String {
        match (&self.failure, self.shader_stages.get(shader)) {
            (Some(Failure::Compile(stage, log)), Some(s)) if stage == s => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: Handle) {
        self.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Result<Handle, String> {
        let h = self.allocate()?;
        self.calls.push(Call::CreateProgram(h));
        Ok(h)
    }

    fn delete_program(&mut self, program: Handle) {
        self.calls.push(Call::DeleteProgram(program));
    }

    fn attach_shader(&mut self, program: &Handle, shader: &Handle) {
        self.calls.push(Call::AttachShader(*program, *shader));
    }

    fn transform_feedback_varyings(&mut self, program: &Handle, varyings: &[&str]) {
        self.calls.push(Call::TransformFeedbackVaryings(
            *program,
            varyings.iter().map(|v| v.to_string()).collect(),
        ));
    }

    fn link_program(&mut self, program: &Handle) {
        self.calls.push(Call::LinkProgram(*program));
    }

    fn program_link_status(&mut self, _program: &Handle) -> bool {
        !matches!(self.failure, Some(Failure::Link(_)))
    }

    fn program_info_log(&mut self, _program: &Handle) -> String {
        match &self.failure {
            Some(Failure::Link(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn use_program(&mut self, program: Option<&Handle>) {
        self.calls.push(Call::UseProgram(program.copied()));
    }

    fn attrib_location(&mut self, program: &Handle, name: &str) -> Option<u32> {
        self.calls.push(Call::AttribLocation(*program, name.to_string()));
        if let Some(location) = self.attributes.get(name) {
            return *location;
        }
        let location = self.next_auto_location;
        self.next_auto_location += 4;
        self.attributes.insert(name.to_string(), Some(location));
        Some(location)
    }

    fn uniform_location(&mut self, program: &Handle, name: &str) -> Option<String> {
        self.calls.push(Call::UniformLocation(*program, name.to_string()));
        (!self.inactive_uniforms.contains(name)).then(|| name.to_string())
    }

    fn create_vertex_array(&mut self) -> Result<Handle, String> {
        let h = self.allocate()?;
        self.calls.push(Call::CreateVertexArray(h));
        Ok(h)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&Handle>) {
        self.calls.push(Call::BindVertexArray(vertex_array.copied()));
    }

    fn delete_vertex_array(&mut self, vertex_array: Handle) {
        self.calls.push(Call::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&mut self) -> Result<Handle, String> {
        let h = self.allocate()?;
        self.calls.push(Call::CreateBuffer(h));
        Ok(h)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&Handle>) {
        self.calls.push(Call::BindBuffer(target, buffer.copied()));
    }

    fn delete_buffer(&mut self, buffer: Handle) {
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.calls.push(Call::BufferData { target, len: data.len(), usage });
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: i32, data: &[u8]) {
        self.calls.push(Call::BufferSubData { target, offset, len: data.len() });
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(Call::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer_f32(&mut self, index: u32, size: i32, stride: i32, offset: i32) {
        self.calls.push(Call::VertexAttribPointer { index, size, stride, offset });
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        self.calls.push(Call::VertexAttribDivisor { index, divisor });
    }

    fn uniform_1_i32(&mut self, location: &String, value: i32) {
        self.calls.push(Call::Uniform1i(location.clone(), value));
    }

    fn uniform_1_f32(&mut self, location: &String, value: f32) {
        self.calls.push(Call::Uniform1f(location.clone(), value));
    }

    fn uniform_f32_slice(&mut self, location: &String, components: u32, values: &[f32]) {
        self.calls.push(Call::UniformFloatVec {
            location: location.clone(),
            components,
            values: values.to_vec(),
        });
    }

    fn uniform_i32_slice(&mut self, location: &String, components: u32, values: &[i32]) {
        self.calls.push(Call::UniformIntVec {
            location: location.clone(),
            components,
            values: values.to_vec(),
        });
    }

    fn uniform_matrix_f32_slice(&mut self, location: &String, dim: u32, transpose: bool, values: &[f32]) {
        self.calls.push(Call::UniformMatrix {
            location: location.clone(),
            dim,
            transpose,
            values: values.to_vec(),
        });
    }

    fn create_texture(&mut self) -> Result<Handle, String> {
        let h = self.allocate()?;
        self.calls.push(Call::CreateTexture(h));
        Ok(h)
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(Call::ActiveTexture(unit));
    }

    fn bind_texture_2d(&mut self, texture: Option<&Handle>) {
        self.calls.push(Call::BindTexture2d(texture.copied()));
    }

    fn tex_image_2d(&mut self, width: i32, height: i32, format: TextureFormat, _pixels: Option<&[u8]>) {
        self.calls.push(Call::TexImage2d { width, height, format });
    }

    fn tex_sampling(&mut self, filter: TextureFilter) {
        self.calls.push(Call::TexSampling(filter));
    }

    fn create_framebuffer(&mut self) -> Result<Handle, String> {
        let h = self.allocate()?;
        self.calls.push(Call::CreateFramebuffer(h));
        Ok(h)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<&Handle>) {
        self.calls.push(Call::BindFramebuffer(framebuffer.copied()));
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: &Handle) {
        self.calls.push(Call::FramebufferTexture2d(attachment, *texture));
    }

    fn framebuffer_complete(&mut self) -> bool {
        true
    }

    fn draw_buffers(&mut self, buffers: &[DrawBuffer]) {
        self.calls.push(Call::DrawBuffers(buffers.to_vec()));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.calls.push(Call::Viewport(x, y, width, height));
    }

    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
        self.calls.push(Call::Clear { color, depth });
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        self.calls.push(Call::DrawArrays { mode, first, count });
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32, offset: i32) {
        self.calls.push(Call::DrawElements { mode, count, offset });
    }

    fn draw_arrays_instanced(&mut self, mode: Primitive, first: i32, count: i32, instances: i32) {
        self.calls.push(Call::DrawArraysInstanced { mode, first, count, instances });
    }

    fn draw_elements_instanced(&mut self, mode: Primitive, count: i32, offset: i32, instances: i32) {
        self.calls.push(Call::DrawElementsInstanced { mode, count, offset, instances });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_locations_leave_room_for_matrix_slots() {
        let mut gl = RecordingGl::new();
        let p = gl.create_program().unwrap();
        assert_eq!(gl.attrib_location(&p, "a_position"), Some(0));
        assert_eq!(gl.attrib_location(&p, "a_matrix"), Some(4));
        assert_eq!(gl.attrib_location(&p, "a_position"), Some(0));
    }

    #[test]
    fn compile_failure_only_hits_requested_stage() {
        let mut gl = RecordingGl::new();
        gl.fail_with(Failure::Compile(ShaderStage::Fragment, "bad".into()));
        let vs = gl.create_shader(ShaderStage::Vertex).unwrap();
        let fs = gl.create_shader(ShaderStage::Fragment).unwrap();
        assert!(gl.shader_compile_status(&vs));
        assert!(!gl.shader_compile_status(&fs));
        assert_eq!(gl.shader_info_log(&fs), "bad");
    }

    #[test]
    fn allocation_failure_returns_error() {
        let mut gl = RecordingGl::new();
        gl.fail_with(Failure::Allocation);
        assert!(gl.create_buffer().is_err());
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn allocation_after_counts_down() {
        let mut gl = RecordingGl::new();
        gl.fail_with(Failure::AllocationAfter(2));
        assert!(gl.create_vertex_array().is_ok());
        assert!(gl.create_buffer().is_ok());
        assert!(gl.create_buffer().is_err());
        assert!(gl.create_buffer().is_err());
    }
}
