//! Draw dispatch against the bound program, geometry and target.

use crate::context::Context;
use crate::gl::{GlBackend, Primitive};

impl<G: GlBackend> Context<G> {
    /// Draws the bound geometry with its recorded count.
    ///
    /// `use_indices` selects the indexed path; asking for it on geometry
    /// built without an index buffer is a caller error and draws nothing.
    pub fn draw(&mut self, mode: Primitive, use_indices: bool) {
        let Some(id) = self.bound.geometry.get() else {
            log::error!("draw: no geometry bound");
            return;
        };
        let Some(geometry) = self.geometries.get(id) else { return };
        if self.bound.program.get().is_none() {
            log::error!("draw: no program bound for geometry `{id}`");
            return;
        }

        let count = geometry.count as i32;
        if !use_indices {
            self.gl.draw_arrays(mode, 0, count);
        } else if geometry.is_indexed() {
            self.gl.draw_elements(mode, count, 0);
        } else {
            log::error!("draw: geometry `{id}` has no index buffer");
        }
    }

    /// Draws `instances` instances of the bound geometry as triangles.
    ///
    /// Indexed geometry uses its index count, other geometry its vertex
    /// count. Zero instances still issues the draw.
    pub fn draw_instanced(&mut self, instances: u32) {
        let Some(id) = self.bound.geometry.get() else {
            log::error!("draw_instanced: no geometry bound");
            return;
        };
        let Some(geometry) = self.geometries.get(id) else { return };
        if self.bound.program.get().is_none() {
            log::error!("draw_instanced: no program bound for geometry `{id}`");
            return;
        }

        let count = geometry.count as i32;
        let instances = instances as i32;
        if geometry.is_indexed() {
            self.gl
                .draw_elements_instanced(Primitive::Triangles, count, 0, instances);
        } else {
            self.gl
                .draw_arrays_instanced(Primitive::Triangles, 0, count, instances);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeType;
    use crate::context::ContextInit;
    use crate::gl::{Call, RecordingGl};
    use crate::program::ProgramDesc;

    fn ctx() -> Context<RecordingGl> {
        let mut ctx = Context::new(RecordingGl::new(), ContextInit::default());
        ctx.create_program(&ProgramDesc::new("p", "v", "f").attribute("a_position", AttributeType::Vec3))
            .unwrap();
        ctx.create_geometry("tri", &[("a_position", &[0.0; 9])], Some(&[0, 1, 2]))
            .unwrap();
        ctx.create_geometry("strip", &[("a_position", &[0.0; 12])], None)
            .unwrap();
        ctx.gl_mut().take_calls();
        ctx
    }

    #[test]
    fn indexed_draw_uses_index_count() {
        let mut ctx = ctx();
        ctx.use_program("p");
        ctx.use_geometry("tri");
        ctx.gl_mut().take_calls();

        ctx.draw(Primitive::Triangles, true);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::DrawElements { mode: Primitive::Triangles, count: 3, offset: 0 }]
        );
    }

    #[test]
    fn array_draw_uses_vertex_count() {
        let mut ctx = ctx();
        ctx.use_program("p");
        ctx.use_geometry("strip");
        ctx.gl_mut().take_calls();

        ctx.draw(Primitive::TriangleStrip, false);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::DrawArrays { mode: Primitive::TriangleStrip, first: 0, count: 4 }]
        );
    }

    #[test]
    fn zero_instances_still_draws() {
        let mut ctx = ctx();
        ctx.use_program("p");
        ctx.use_geometry("tri");
        ctx.gl_mut().take_calls();

        ctx.draw_instanced(0);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::DrawElementsInstanced {
                mode: Primitive::Triangles,
                count: 3,
                offset: 0,
                instances: 0,
            }]
        );
    }

    #[test]
    fn instanced_without_indices_draws_arrays() {
        let mut ctx = ctx();
        ctx.use_program("p");
        ctx.use_geometry("strip");
        ctx.gl_mut().take_calls();

        ctx.draw_instanced(25);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::DrawArraysInstanced {
                mode: Primitive::Triangles,
                first: 0,
                count: 4,
                instances: 25,
            }]
        );
    }

    #[test]
    fn nothing_bound_draws_nothing() {
        let mut ctx = ctx();
        ctx.draw(Primitive::Triangles, true);
        ctx.draw_instanced(4);
        ctx.use_geometry("tri");
        ctx.draw(Primitive::Triangles, true);
        assert_eq!(ctx.gl().count(|c| matches!(c, Call::DrawElements { .. } | Call::DrawElementsInstanced { .. })), 0);
    }

    #[test]
    fn indexed_request_on_unindexed_geometry_draws_nothing() {
        let mut ctx = ctx();
        ctx.use_program("p");
        ctx.use_geometry("strip");
        ctx.gl_mut().take_calls();
        ctx.draw(Primitive::Triangles, true);
        assert!(ctx.gl().calls().is_empty());
    }
}
