//! Uniform semantics and the uniform dispatcher.

use crate::context::Context;
use crate::gl::GlBackend;

/// Semantic type of a uniform as declared by a program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    Mat2,
    Mat3,
    Mat4,
}

/// Which family of driver upload call a uniform type maps to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadShape {
    /// `uniform1i` / `uniform1f` with a bare number.
    Scalar,
    /// `uniform{n}fv` / `uniform{n}iv` with an array.
    Vector(u32),
    /// `uniformMatrix{n}fv` with `transpose = false`.
    Matrix(u32),
}

impl UniformType {
    pub fn shape(self) -> UploadShape {
        match self {
            UniformType::Int | UniformType::Float => UploadShape::Scalar,
            UniformType::Vec2 | UniformType::IVec2 => UploadShape::Vector(2),
            UniformType::Vec3 | UniformType::IVec3 => UploadShape::Vector(3),
            UniformType::Vec4 | UniformType::IVec4 => UploadShape::Vector(4),
            UniformType::Mat2 => UploadShape::Matrix(2),
            UniformType::Mat3 => UploadShape::Matrix(3),
            UniformType::Mat4 => UploadShape::Matrix(4),
        }
    }

    pub fn glsl_name(self) -> &'static str {
        match self {
            UniformType::Int => "int",
            UniformType::Float => "float",
            UniformType::Vec2 => "vec2",
            UniformType::Vec3 => "vec3",
            UniformType::Vec4 => "vec4",
            UniformType::IVec2 => "ivec2",
            UniformType::IVec3 => "ivec3",
            UniformType::IVec4 => "ivec4",
            UniformType::Mat2 => "mat2",
            UniformType::Mat3 => "mat3",
            UniformType::Mat4 => "mat4",
        }
    }
}

/// A typed uniform value. Matrices are flattened column-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::IVec2(_) => UniformType::IVec2,
            UniformValue::IVec3(_) => UniformType::IVec3,
            UniformValue::IVec4(_) => UniformType::IVec4,
            UniformValue::Mat2(_) => UniformType::Mat2,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    /// Reinterprets the value as `ty`.
    ///
    /// Identical types pass through. Int and float scalars and vectors
    /// convert into each other, and four floats serve as either `vec4` or
    /// `mat2`. Any other pairing has no meaning and yields `None`.
    pub fn coerce(self, ty: UniformType) -> Option<UniformValue> {
        use UniformValue as V;
        if self.ty() == ty {
            return Some(self);
        }
        let coerced = match (self, ty) {
            (V::Float(v), UniformType::Int) => V::Int(v as i32),
            (V::Int(v), UniformType::Float) => V::Float(v as f32),
            (V::Vec2(v), UniformType::IVec2) => V::IVec2(v.map(|c| c as i32)),
            (V::Vec3(v), UniformType::IVec3) => V::IVec3(v.map(|c| c as i32)),
            (V::Vec4(v), UniformType::IVec4) => V::IVec4(v.map(|c| c as i32)),
            (V::IVec2(v), UniformType::Vec2) => V::Vec2(v.map(|c| c as f32)),
            (V::IVec3(v), UniformType::Vec3) => V::Vec3(v.map(|c| c as f32)),
            (V::IVec4(v), UniformType::Vec4) => V::Vec4(v.map(|c| c as f32)),
            (V::Vec4(v), UniformType::Mat2) => V::Mat2(v),
            (V::Mat2(v), UniformType::Vec4) => V::Vec4(v),
            _ => return None,
        };
        Some(coerced)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

/// Four floats are a `vec4` unless the program declared the uniform `mat2`.
impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[f32; 9]> for UniformValue {
    fn from(v: [f32; 9]) -> Self {
        UniformValue::Mat3(v)
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(v: [f32; 16]) -> Self {
        UniformValue::Mat4(v)
    }
}

impl From<[i32; 2]> for UniformValue {
    fn from(v: [i32; 2]) -> Self {
        UniformValue::IVec2(v)
    }
}

impl From<[i32; 3]> for UniformValue {
    fn from(v: [i32; 3]) -> Self {
        UniformValue::IVec3(v)
    }
}

impl From<[i32; 4]> for UniformValue {
    fn from(v: [i32; 4]) -> Self {
        UniformValue::IVec4(v)
    }
}

/// Issues the driver upload call matching `value`'s variant.
pub(crate) fn upload<G: GlBackend>(gl: &mut G, location: &G::UniformLocation, value: &UniformValue) {
    match value {
        UniformValue::Int(v) => gl.uniform_1_i32(location, *v),
        UniformValue::Float(v) => gl.uniform_1_f32(location, *v),
        UniformValue::Vec2(v) => gl.uniform_f32_slice(location, 2, v),
        UniformValue::Vec3(v) => gl.uniform_f32_slice(location, 3, v),
        UniformValue::Vec4(v) => gl.uniform_f32_slice(location, 4, v),
        UniformValue::IVec2(v) => gl.uniform_i32_slice(location, 2, v),
        UniformValue::IVec3(v) => gl.uniform_i32_slice(location, 3, v),
        UniformValue::IVec4(v) => gl.uniform_i32_slice(location, 4, v),
        UniformValue::Mat2(v) => gl.uniform_matrix_f32_slice(location, 2, false, v),
        UniformValue::Mat3(v) => gl.uniform_matrix_f32_slice(location, 3, false, v),
        UniformValue::Mat4(v) => gl.uniform_matrix_f32_slice(location, 4, false, v),
    }
}

impl<G: GlBackend> Context<G> {
    /// Uploads uniform values to the currently bound program.
    ///
    /// `None` values are skipped and leave the previous GPU-side value in
    /// place. Names with no resolved location in the current program are
    /// no-ops (a one-time debug message is logged per program and name).
    ///
    /// When the program registered a type for the uniform, the upload call
    /// follows that type and the value is coerced to it; a value that cannot
    /// be coerced is skipped. Uniforms resolved without a type upload by the
    /// value's own variant.
    pub fn set_uniforms<'n, I>(&mut self, uniforms: I)
    where
        I: IntoIterator<Item = (&'n str, Option<UniformValue>)>,
    {
        let Some(program_id) = self.bound.program.get() else {
            log::debug!("set_uniforms called with no program bound; ignored");
            return;
        };
        let Some(program) = self.programs.get(program_id) else { return };

        for (name, value) in uniforms {
            let Some(value) = value else { continue };

            let Some(uniform) = program.uniforms.get(name) else {
                if self.warned_uniforms.insert((program_id.to_string(), name.to_string())) {
                    log::debug!("uniform `{name}` has no location in program `{program_id}`; skipped");
                }
                continue;
            };

            let value = match uniform.ty {
                None => value,
                Some(declared) => match value.coerce(declared) {
                    Some(coerced) => coerced,
                    None => {
                        if self.warned_uniforms.insert((program_id.to_string(), name.to_string())) {
                            log::debug!(
                                "uniform `{name}` in program `{program_id}` is {declared:?}, \
                                 got {:?}; skipped",
                                value.ty()
                            );
                        }
                        continue;
                    }
                },
            };

            upload(&mut self.gl, &uniform.location, &value);
        }
    }

    /// Uploads a single uniform to the currently bound program.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.set_uniforms([(name, Some(value.into()))]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextInit;
    use crate::gl::{Call, RecordingGl};
    use crate::program::ProgramDesc;

    fn ctx_with_program(gl: RecordingGl) -> Context<RecordingGl> {
        let mut ctx = Context::new(gl, ContextInit::default());
        let desc = ProgramDesc::new("p", "void main() {}", "void main() {}")
            .uniform("u_light", UniformType::Vec3)
            .uniform("u_vp", UniformType::Mat4)
            .uniform("u_count", UniformType::Int)
            .uniform("u_time", UniformType::Float)
            .uniform("u_cell", UniformType::IVec2)
            .uniform("u_rot", UniformType::Mat2);
        ctx.create_program(&desc).unwrap();
        ctx.use_program("p");
        ctx.gl_mut().take_calls();
        ctx
    }

    #[test]
    fn vec3_dispatches_vector_path() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        ctx.set_uniform("u_light", [1.0, 2.0, 3.0]);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::UniformFloatVec {
                location: "u_light".into(),
                components: 3,
                values: vec![1.0, 2.0, 3.0],
            }]
        );
    }

    #[test]
    fn mat4_dispatches_matrix_path_untransposed() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        let m: [f32; 16] = std::array::from_fn(|i| i as f32);
        ctx.set_uniform("u_vp", m);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::UniformMatrix {
                location: "u_vp".into(),
                dim: 4,
                transpose: false,
                values: m.to_vec(),
            }]
        );
    }

    #[test]
    fn declared_type_picks_the_upload_call() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        ctx.set_uniform("u_rot", [1.0, 0.0, 0.0, 1.0]);
        ctx.set_uniform("u_count", 3.0f32);
        ctx.set_uniform("u_time", 2i32);
        assert_eq!(
            ctx.gl().calls(),
            &[
                Call::UniformMatrix {
                    location: "u_rot".into(),
                    dim: 2,
                    transpose: false,
                    values: vec![1.0, 0.0, 0.0, 1.0],
                },
                Call::Uniform1i("u_count".into(), 3),
                Call::Uniform1f("u_time".into(), 2.0),
            ]
        );
    }

    #[test]
    fn incompatible_value_for_declared_type_is_skipped() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        ctx.set_uniform("u_vp", [1.0, 2.0, 3.0]);
        ctx.set_uniform("u_light", 1.0f32);
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn untyped_uniform_uploads_by_value_variant() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        ctx.resolve_uniforms("p", &[("u_tint", None)]).unwrap();
        ctx.gl_mut().take_calls();

        ctx.set_uniform("u_tint", [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::UniformFloatVec {
                location: "u_tint".into(),
                components: 4,
                values: vec![0.5, 0.5, 0.5, 1.0],
            }]
        );
    }

    #[test]
    fn coerce_converts_compatible_payloads_only() {
        assert_eq!(UniformValue::Vec4([1.0; 4]).coerce(UniformType::Mat2), Some(UniformValue::Mat2([1.0; 4])));
        assert_eq!(UniformValue::Vec2([1.9, -2.0]).coerce(UniformType::IVec2), Some(UniformValue::IVec2([1, -2])));
        assert_eq!(UniformValue::Mat4([0.0; 16]).coerce(UniformType::Mat4), Some(UniformValue::Mat4([0.0; 16])));
        assert_eq!(UniformValue::Mat3([0.0; 9]).coerce(UniformType::Mat4), None);
        assert_eq!(UniformValue::Vec3([0.0; 3]).coerce(UniformType::Vec4), None);
    }

    #[test]
    fn scalars_pass_bare_numbers() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        ctx.set_uniforms([
            ("u_count", Some(UniformValue::Int(7))),
            ("u_time", Some(UniformValue::Float(0.5))),
            ("u_cell", Some(UniformValue::IVec2([1, 2]))),
        ]);
        assert_eq!(
            ctx.gl().calls(),
            &[
                Call::Uniform1i("u_count".into(), 7),
                Call::Uniform1f("u_time".into(), 0.5),
                Call::UniformIntVec { location: "u_cell".into(), components: 2, values: vec![1, 2] },
            ]
        );
    }

    #[test]
    fn absent_values_are_skipped() {
        let mut ctx = ctx_with_program(RecordingGl::new());
        ctx.set_uniforms([("u_light", None), ("u_time", Some(UniformValue::Float(1.0)))]);
        assert_eq!(ctx.gl().calls(), &[Call::Uniform1f("u_time".into(), 1.0)]);
    }

    #[test]
    fn unresolved_names_are_noops() {
        let mut ctx = ctx_with_program(RecordingGl::new().with_inactive_uniform("u_time"));
        ctx.set_uniform("u_time", 1.0);
        ctx.set_uniform("u_typo", 1.0);
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn nothing_uploads_without_bound_program() {
        let mut ctx = Context::new(RecordingGl::new(), ContextInit::default());
        ctx.set_uniform("u_time", 1.0);
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn upload_shape_classifies_types() {
        assert_eq!(UniformType::Int.shape(), UploadShape::Scalar);
        assert_eq!(UniformType::IVec4.shape(), UploadShape::Vector(4));
        assert_eq!(UniformType::Mat3.shape(), UploadShape::Matrix(3));
    }
}
