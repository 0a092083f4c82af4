//! Program registry: compile/link, attribute and uniform resolution, binding.

use std::collections::HashMap;

use crate::attribute::{AttributeLayout, AttributeType};
use crate::context::Context;
use crate::error::{allocated, Error, ResourceKind, Result};
use crate::gl::{GlBackend, ShaderStage};
use crate::uniform::UniformType;

pub(crate) struct ResolvedUniform<L> {
    pub location: L,
    /// Declared type, when the uniform was registered with one.
    pub ty: Option<UniformType>,
}

pub(crate) struct ProgramEntry<G: GlBackend> {
    pub handle: G::Program,
    pub uniforms: HashMap<String, ResolvedUniform<G::UniformLocation>>,
}

/// Declarative description of a program.
///
/// Attribute and uniform order is preserved; it decides declaration order
/// when interface declarations are generated from [`header`](Self::header).
#[derive(Debug, Clone, Default)]
pub struct ProgramDesc {
    pub id: String,
    pub attributes: Vec<(String, AttributeType)>,
    pub uniforms: Vec<(String, UniformType)>,
    pub vertex: String,
    pub fragment: String,
    pub transform_feedback: Vec<String>,
    /// When set (e.g. `"#version 330 core"`), the attribute and uniform
    /// declarations are generated after this line and the sources are
    /// treated as bodies. When `None`, sources are used verbatim.
    pub header: Option<String>,
}

impl ProgramDesc {
    pub fn new(id: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, ty: AttributeType) -> Self {
        self.attributes.push((name.into(), ty));
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, ty: UniformType) -> Self {
        self.uniforms.push((name.into(), ty));
        self
    }

    pub fn transform_feedback<S: Into<String>>(mut self, outputs: impl IntoIterator<Item = S>) -> Self {
        self.transform_feedback = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Final vertex-stage source.
    pub fn vertex_source(&self) -> String {
        match &self.header {
            None => self.vertex.clone(),
            Some(header) => {
                let mut src = format!("{header}\n");
                for (name, ty) in &self.attributes {
                    src.push_str(&format!("in {} {name};\n", ty.glsl_name()));
                }
                self.push_uniform_decls(&mut src);
                src.push_str(&self.vertex);
                src
            }
        }
    }

    /// Final fragment-stage source.
    pub fn fragment_source(&self) -> String {
        match &self.header {
            None => self.fragment.clone(),
            Some(header) => {
                let mut src = format!("{header}\nprecision highp float;\n");
                self.push_uniform_decls(&mut src);
                src.push_str(&self.fragment);
                src
            }
        }
    }

    fn push_uniform_decls(&self, src: &mut String) {
        for (name, ty) in &self.uniforms {
            src.push_str(&format!("uniform {} {name};\n", ty.glsl_name()));
        }
    }
}

impl<G: GlBackend> Context<G> {
    /// Compiles and links a vertex+fragment pair and registers it under `id`.
    ///
    /// Replaces any program previously registered under `id`; the replaced
    /// program object is not released.
    pub fn compile_program(
        &mut self,
        id: &str,
        vertex_source: &str,
        fragment_source: &str,
        transform_feedback: &[&str],
    ) -> Result<()> {
        let vertex = self.compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile_stage(ShaderStage::Fragment, fragment_source) {
            Ok(f) => f,
            Err(e) => {
                self.gl.delete_shader(vertex);
                return Err(e);
            }
        };

        let linked = self.link(id, &vertex, &fragment, transform_feedback);
        self.gl.delete_shader(vertex);
        self.gl.delete_shader(fragment);
        let handle = linked?;

        if self.programs.contains_key(id) {
            log::debug!("program `{id}` redefined");
            if self.bound.program.get() == Some(id) {
                self.bound.program.invalidate();
            }
        }
        self.programs.insert(
            id.to_string(),
            ProgramEntry { handle, uniforms: HashMap::new() },
        );
        log::debug!("program `{id}` linked");
        Ok(())
    }

    /// Resolves location and stride of each attribute not resolved yet.
    ///
    /// Already-resolved names are left untouched; the first program to
    /// declare a name wins. Names the program does not actually use stay
    /// unresolved.
    pub fn resolve_attributes(&mut self, id: &str, attributes: &[(&str, AttributeType)]) -> Result<()> {
        let program = self
            .programs
            .get(id)
            .ok_or_else(|| Error::UnknownProgram(id.to_string()))?;

        for (name, ty) in attributes {
            if self.attributes.is_resolved(name) {
                continue;
            }
            match self.gl.attrib_location(&program.handle, name) {
                Some(location) => {
                    self.attributes
                        .insert_first(name, AttributeLayout { location, stride: ty.stride() });
                }
                None => log::debug!("attribute `{name}` is inactive in program `{id}`"),
            }
        }
        Ok(())
    }

    /// Queries and caches uniform locations for program `id`.
    ///
    /// Uniforms the driver reports as inactive are skipped silently.
    pub fn resolve_uniforms(&mut self, id: &str, uniforms: &[(&str, Option<UniformType>)]) -> Result<()> {
        let program = self
            .programs
            .get_mut(id)
            .ok_or_else(|| Error::UnknownProgram(id.to_string()))?;

        for (name, ty) in uniforms {
            if let Some(location) = self.gl.uniform_location(&program.handle, name) {
                program
                    .uniforms
                    .insert(name.to_string(), ResolvedUniform { location, ty: *ty });
            }
        }
        Ok(())
    }

    /// Compiles `desc` and resolves its declared attributes and uniforms.
    pub fn create_program(&mut self, desc: &ProgramDesc) -> Result<()> {
        let outputs: Vec<&str> = desc.transform_feedback.iter().map(String::as_str).collect();
        self.compile_program(&desc.id, &desc.vertex_source(), &desc.fragment_source(), &outputs)?;

        let attributes: Vec<(&str, AttributeType)> =
            desc.attributes.iter().map(|(n, t)| (n.as_str(), *t)).collect();
        self.resolve_attributes(&desc.id, &attributes)?;

        let uniforms: Vec<(&str, Option<UniformType>)> =
            desc.uniforms.iter().map(|(n, t)| (n.as_str(), Some(*t))).collect();
        self.resolve_uniforms(&desc.id, &uniforms)
    }

    /// Binds program `id` unless it is already the current program.
    pub fn use_program(&mut self, id: &str) {
        if self.bound.program.get() == Some(id) {
            return;
        }
        let Some(program) = self.programs.get(id) else {
            log::error!("use_program: no program registered under `{id}`");
            return;
        };
        self.gl.use_program(Some(&program.handle));
        self.bound.program.transition(id);
    }

    #[inline]
    pub fn has_program(&self, id: &str) -> bool {
        self.programs.contains_key(id)
    }

    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<G::Shader> {
        let shader = allocated(ResourceKind::Shader, self.gl.create_shader(stage))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);
        if self.gl.shader_compile_status(&shader) {
            return Ok(shader);
        }
        let log = self.gl.shader_info_log(&shader);
        self.gl.delete_shader(shader);
        Err(Error::ShaderCompile { stage, log })
    }

    fn link(
        &mut self,
        id: &str,
        vertex: &G::Shader,
        fragment: &G::Shader,
        transform_feedback: &[&str],
    ) -> Result<G::Program> {
        let program = allocated(ResourceKind::Program, self.gl.create_program())?;
        self.gl.attach_shader(&program, vertex);
        self.gl.attach_shader(&program, fragment);
        if !transform_feedback.is_empty() {
            self.gl.transform_feedback_varyings(&program, transform_feedback);
        }
        self.gl.link_program(&program);
        if self.gl.program_link_status(&program) {
            return Ok(program);
        }
        let log = self.gl.program_info_log(&program);
        self.gl.delete_program(program);
        Err(Error::ProgramLink { id: id.to_string(), log })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextInit;
    use crate::gl::{Call, Failure, RecordingGl};

    fn ctx() -> Context<RecordingGl> {
        Context::new(RecordingGl::new(), ContextInit::default())
    }

    #[test]
    fn compile_failure_reports_stage_and_log() {
        let mut ctx = ctx();
        ctx.gl_mut()
            .fail_with(Failure::Compile(ShaderStage::Fragment, "0:3: syntax error".into()));
        let err = ctx.compile_program("p", "v", "f", &[]).unwrap_err();
        assert_eq!(
            err,
            Error::ShaderCompile { stage: ShaderStage::Fragment, log: "0:3: syntax error".into() }
        );
        assert!(!ctx.has_program("p"));
    }

    #[test]
    fn link_failure_reports_log() {
        let mut ctx = ctx();
        ctx.gl_mut().fail_with(Failure::Link("varying mismatch".into()));
        let err = ctx.compile_program("p", "v", "f", &["v_out"]).unwrap_err();
        assert_eq!(err, Error::ProgramLink { id: "p".into(), log: "varying mismatch".into() });
    }

    #[test]
    fn shaders_are_released_after_link() {
        let mut ctx = ctx();
        ctx.compile_program("p", "v", "f", &[]).unwrap();
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::DeleteProgram(_))), 0);
    }

    #[test]
    fn failed_link_releases_shaders_and_program() {
        let mut ctx = ctx();
        ctx.gl_mut().fail_with(Failure::Link("undefined symbol".into()));
        ctx.compile_program("p", "v", "f", &[]).unwrap_err();
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::DeleteProgram(_))), 1);
    }

    #[test]
    fn redefining_bound_program_forces_rebind() {
        let mut ctx = ctx();
        ctx.compile_program("a", "v", "f", &[]).unwrap();
        ctx.use_program("a");
        ctx.compile_program("a", "v2", "f2", &[]).unwrap();
        assert_eq!(ctx.bound().program.get(), None);
        ctx.gl_mut().take_calls();

        ctx.use_program("a");
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::UseProgram(Some(_)))), 1);
    }

    #[test]
    fn transform_feedback_outputs_are_declared_before_link() {
        let mut ctx = ctx();
        ctx.compile_program("tf", "v", "f", &["v_position", "v_velocity"]).unwrap();
        let calls = ctx.gl().calls();
        let tf = calls
            .iter()
            .position(|c| matches!(c, Call::TransformFeedbackVaryings(_, v) if v.len() == 2))
            .unwrap();
        let link = calls.iter().position(|c| matches!(c, Call::LinkProgram(_))).unwrap();
        assert!(tf < link);
    }

    #[test]
    fn allocation_failure_is_resource_error() {
        let mut ctx = ctx();
        ctx.gl_mut().fail_with(Failure::Allocation);
        let err = ctx.compile_program("p", "v", "f", &[]).unwrap_err();
        assert!(matches!(err, Error::ResourceAllocation { kind: ResourceKind::Shader, .. }));
    }

    #[test]
    fn use_program_elides_repeated_binds() {
        let mut ctx = ctx();
        ctx.compile_program("a", "v", "f", &[]).unwrap();
        ctx.compile_program("b", "v", "f", &[]).unwrap();
        ctx.gl_mut().take_calls();

        for id in ["a", "a", "b", "b", "b", "a", "a"] {
            ctx.use_program(id);
        }
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::UseProgram(_))), 3);
    }

    #[test]
    fn first_program_declaring_an_attribute_wins() {
        let gl = RecordingGl::new().with_attribute("a_position", 2);
        let mut ctx = Context::new(gl, ContextInit::default());
        ctx.create_program(&ProgramDesc::new("a", "v", "f").attribute("a_position", AttributeType::Vec3))
            .unwrap();
        ctx.create_program(&ProgramDesc::new("b", "v", "f").attribute("a_position", AttributeType::Vec4))
            .unwrap();

        let layout = ctx.attribute_layout("a_position").unwrap();
        assert_eq!(layout.location, 2);
        assert_eq!(layout.stride, AttributeType::Vec3.stride());
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::AttribLocation(..))), 1);
    }

    #[test]
    fn inactive_attribute_stays_unresolved() {
        let gl = RecordingGl::new().with_inactive_attribute("a_normal");
        let mut ctx = Context::new(gl, ContextInit::default());
        ctx.create_program(&ProgramDesc::new("a", "v", "f").attribute("a_normal", AttributeType::Vec3))
            .unwrap();
        assert!(ctx.attribute_layout("a_normal").is_none());
    }

    #[test]
    fn resolve_against_unknown_program_fails() {
        let mut ctx = ctx();
        let err = ctx.resolve_uniforms("missing", &[("u_x", None)]).unwrap_err();
        assert_eq!(err, Error::UnknownProgram("missing".into()));
    }

    #[test]
    fn header_generates_interface_declarations() {
        let desc = ProgramDesc::new("p", "void main() {}", "void main() {}")
            .header("#version 330 core")
            .attribute("a_position", AttributeType::Vec3)
            .attribute("a_mMatrix", AttributeType::Mat4)
            .uniform("u_vpMatrix", UniformType::Mat4);

        let vs = desc.vertex_source();
        assert!(vs.starts_with("#version 330 core\n"));
        assert!(vs.contains("in vec3 a_position;\n"));
        assert!(vs.contains("in mat4 a_mMatrix;\n"));
        assert!(vs.contains("uniform mat4 u_vpMatrix;\n"));
        assert!(vs.ends_with("void main() {}"));

        let fs = desc.fragment_source();
        assert!(!fs.contains("a_position"));
        assert!(fs.contains("uniform mat4 u_vpMatrix;\n"));
    }

    #[test]
    fn sources_without_header_are_verbatim() {
        let desc = ProgramDesc::new("p", "VS", "FS").attribute("a", AttributeType::Float);
        assert_eq!(desc.vertex_source(), "VS");
        assert_eq!(desc.fragment_source(), "FS");
    }
}
