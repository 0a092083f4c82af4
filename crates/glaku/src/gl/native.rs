use glow::HasContext;

use super::{
    Attachment, BufferTarget, BufferUsage, Capability, DrawBuffer, GlBackend, Primitive,
    ShaderStage, TextureFilter, TextureFormat,
};

type Native = glow::Context;

// Every method forwards to glow. The `unsafe` blocks rely on the caller
// keeping the GL context current on this thread, which is the documented
// precondition of `GlBackend`.
impl GlBackend for glow::Context {
    type Shader = <Native as HasContext>::Shader;
    type Program = <Native as HasContext>::Program;
    type Buffer = <Native as HasContext>::Buffer;
    type VertexArray = <Native as HasContext>::VertexArray;
    type Texture = <Native as HasContext>::Texture;
    type Framebuffer = <Native as HasContext>::Framebuffer;
    type UniformLocation = <Native as HasContext>::UniformLocation;

    fn enable(&mut self, capability: Capability) {
        unsafe { HasContext::enable(self, capability_enum(capability)) }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let ty = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { HasContext::create_shader(self, ty) }
    }

    fn shader_source(&mut self, shader: &Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, *shader, source) }
    }

    fn compile_shader(&mut self, shader: &Self::Shader) {
        unsafe { HasContext::compile_shader(self, *shader) }
    }

    fn shader_compile_status(&mut self, shader: &Self::Shader) -> bool {
        unsafe { self.get_shader_compile_status(*shader) }
    }

    fn shader_info_log(&mut self, shader: &Self::Shader) -> String {
        unsafe { self.get_shader_info_log(*shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader) {
        unsafe { HasContext::attach_shader(self, *program, *shader) }
    }

    fn transform_feedback_varyings(&mut self, program: &Self::Program, varyings: &[&str]) {
        unsafe {
            HasContext::transform_feedback_varyings(
                self,
                *program,
                varyings,
                glow::SEPARATE_ATTRIBS,
            )
        }
    }

    fn link_program(&mut self, program: &Self::Program) {
        unsafe { HasContext::link_program(self, *program) }
    }

    fn program_link_status(&mut self, program: &Self::Program) -> bool {
        unsafe { self.get_program_link_status(*program) }
    }

    fn program_info_log(&mut self, program: &Self::Program) -> String {
        unsafe { self.get_program_info_log(*program) }
    }

    fn use_program(&mut self, program: Option<&Self::Program>) {
        unsafe { HasContext::use_program(self, program.copied()) }
    }

    fn attrib_location(&mut self, program: &Self::Program, name: &str) -> Option<u32> {
        unsafe { self.get_attrib_location(*program, name) }
    }

    fn uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(*program, name) }
    }

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array.copied()) }
    }

    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, buffer_target(target), buffer.copied()) }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        };
        unsafe { self.buffer_data_u8_slice(buffer_target(target), data, usage) }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: i32, data: &[u8]) {
        unsafe { self.buffer_sub_data_u8_slice(buffer_target(target), offset, data) }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn vertex_attrib_pointer_f32(&mut self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe { HasContext::vertex_attrib_pointer_f32(self, index, size, glow::FLOAT, false, stride, offset) }
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        unsafe { HasContext::vertex_attrib_divisor(self, index, divisor) }
    }

    fn uniform_1_i32(&mut self, location: &Self::UniformLocation, value: i32) {
        unsafe { HasContext::uniform_1_i32(self, Some(location), value) }
    }

    fn uniform_1_f32(&mut self, location: &Self::UniformLocation, value: f32) {
        unsafe { HasContext::uniform_1_f32(self, Some(location), value) }
    }

    fn uniform_f32_slice(&mut self, location: &Self::UniformLocation, components: u32, values: &[f32]) {
        let location = Some(location);
        unsafe {
            match components {
                1 => self.uniform_1_f32_slice(location, values),
                2 => self.uniform_2_f32_slice(location, values),
                3 => self.uniform_3_f32_slice(location, values),
                _ => self.uniform_4_f32_slice(location, values),
            }
        }
    }

    fn uniform_i32_slice(&mut self, location: &Self::UniformLocation, components: u32, values: &[i32]) {
        let location = Some(location);
        unsafe {
            match components {
                1 => self.uniform_1_i32_slice(location, values),
                2 => self.uniform_2_i32_slice(location, values),
                3 => self.uniform_3_i32_slice(location, values),
                _ => self.uniform_4_i32_slice(location, values),
            }
        }
    }

    fn uniform_matrix_f32_slice(
        &mut self,
        location: &Self::UniformLocation,
        dim: u32,
        transpose: bool,
        values: &[f32],
    ) {
        let location = Some(location);
        unsafe {
            match dim {
                2 => self.uniform_matrix_2_f32_slice(location, transpose, values),
                3 => self.uniform_matrix_3_f32_slice(location, transpose, values),
                _ => self.uniform_matrix_4_f32_slice(location, transpose, values),
            }
        }
    }

    fn create_texture(&mut self) -> Result<Self::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { HasContext::active_texture(self, glow::TEXTURE0 + unit) }
    }

    fn bind_texture_2d(&mut self, texture: Option<&Self::Texture>) {
        unsafe { self.bind_texture(glow::TEXTURE_2D, texture.copied()) }
    }

    fn tex_image_2d(&mut self, width: i32, height: i32, format: TextureFormat, pixels: Option<&[u8]>) {
        let (internal, layout, ty) = texture_format(format);
        unsafe {
            HasContext::tex_image_2d(
                self,
                glow::TEXTURE_2D,
                0,
                internal as i32,
                width,
                height,
                0,
                layout,
                ty,
                pixels,
            )
        }
    }

    fn tex_sampling(&mut self, filter: TextureFilter) {
        let filter = match filter {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
        } as i32;
        unsafe {
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        }
    }

    fn create_framebuffer(&mut self) -> Result<Self::Framebuffer, String> {
        unsafe { HasContext::create_framebuffer(self) }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<&Self::Framebuffer>) {
        unsafe { HasContext::bind_framebuffer(self, glow::FRAMEBUFFER, framebuffer.copied()) }
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: &Self::Texture) {
        let attachment = match attachment {
            Attachment::Color(i) => glow::COLOR_ATTACHMENT0 + i,
            Attachment::Depth => glow::DEPTH_ATTACHMENT,
        };
        unsafe {
            HasContext::framebuffer_texture_2d(
                self,
                glow::FRAMEBUFFER,
                attachment,
                glow::TEXTURE_2D,
                Some(*texture),
                0,
            )
        }
    }

    fn framebuffer_complete(&mut self) -> bool {
        unsafe { self.check_framebuffer_status(glow::FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE }
    }

    fn draw_buffers(&mut self, buffers: &[DrawBuffer]) {
        let raw: Vec<u32> = buffers
            .iter()
            .map(|b| match b {
                DrawBuffer::None => glow::NONE,
                DrawBuffer::Back => glow::BACK,
                DrawBuffer::Color(i) => glow::COLOR_ATTACHMENT0 + i,
            })
            .collect();
        unsafe { HasContext::draw_buffers(self, &raw) }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
        let mut mask = 0;
        unsafe {
            if let Some([r, g, b, a]) = color {
                self.clear_color(r, g, b, a);
                mask |= glow::COLOR_BUFFER_BIT;
            }
            if let Some(d) = depth {
                self.clear_depth_f32(d);
                mask |= glow::DEPTH_BUFFER_BIT;
            }
            if mask != 0 {
                HasContext::clear(self, mask);
            }
        }
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        unsafe { HasContext::draw_arrays(self, primitive(mode), first, count) }
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32, offset: i32) {
        unsafe { HasContext::draw_elements(self, primitive(mode), count, glow::UNSIGNED_SHORT, offset) }
    }

    fn draw_arrays_instanced(&mut self, mode: Primitive, first: i32, count: i32, instances: i32) {
        unsafe { HasContext::draw_arrays_instanced(self, primitive(mode), first, count, instances) }
    }

    fn draw_elements_instanced(&mut self, mode: Primitive, count: i32, offset: i32, instances: i32) {
        unsafe {
            HasContext::draw_elements_instanced(
                self,
                primitive(mode),
                count,
                glow::UNSIGNED_SHORT,
                offset,
                instances,
            )
        }
    }
}

fn capability_enum(c: Capability) -> u32 {
    match c {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::CullFace => glow::CULL_FACE,
        Capability::Blend => glow::BLEND,
        Capability::ScissorTest => glow::SCISSOR_TEST,
        Capability::StencilTest => glow::STENCIL_TEST,
        Capability::RasterizerDiscard => glow::RASTERIZER_DISCARD,
    }
}

fn buffer_target(t: BufferTarget) -> u32 {
    match t {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn primitive(p: Primitive) -> u32 {
    match p {
        Primitive::Points => glow::POINTS,
        Primitive::Lines => glow::LINES,
        Primitive::LineLoop => glow::LINE_LOOP,
        Primitive::LineStrip => glow::LINE_STRIP,
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        Primitive::TriangleFan => glow::TRIANGLE_FAN,
    }
}

/// `(internal format, pixel format, component type)`.
fn texture_format(f: TextureFormat) -> (u32, u32, u32) {
    match f {
        TextureFormat::Rgba8 => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba16F => (glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
        TextureFormat::Rgba32F => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
        TextureFormat::R32F => (glow::R32F, glow::RED, glow::FLOAT),
        TextureFormat::Depth24 => (glow::DEPTH_COMPONENT24, glow::DEPTH_COMPONENT, glow::UNSIGNED_INT),
        TextureFormat::Depth32F => (glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
    }
}
