//! The context: sole owner of the driver, every registered resource and the
//! bound-state triad.

mod bound;
mod init;

use std::collections::{HashMap, HashSet};

pub use bound::{BoundCell, BoundState};
pub use init::{ContextInit, ResizeArgs};

use crate::attribute::{AttributeLayout, AttributeLayouts};
use crate::geometry::GeometryEntry;
use crate::gl::GlBackend;
use crate::program::ProgramEntry;
use crate::target::RenderTargetEntry;
use crate::texture::TextureSlot;

/// GPU resource and draw-state manager over one driver context.
///
/// Single-threaded: every operation is a direct call into the driver. All
/// binds must go through the context, otherwise the bound-state cells drift
/// from the driver's real state.
pub struct Context<G: GlBackend> {
    pub(crate) gl: G,

    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) pixel_ratio: f32,

    pub(crate) programs: HashMap<String, ProgramEntry<G>>,
    pub(crate) geometries: HashMap<String, GeometryEntry<G>>,
    pub(crate) attributes: AttributeLayouts,
    pub(crate) textures: HashMap<String, TextureSlot<G::Texture>>,
    pub(crate) targets: HashMap<String, RenderTargetEntry<G>>,

    pub(crate) bound: BoundState,

    /// (program, uniform) pairs already reported as unresolved or mistyped.
    pub(crate) warned_uniforms: HashSet<(String, String)>,
}

impl<G: GlBackend> Context<G> {
    /// Takes ownership of `gl` and enables `init.options`.
    pub fn new(mut gl: G, init: ContextInit) -> Self {
        for capability in &init.options {
            gl.enable(*capability);
        }
        log::debug!(
            "context created: {}x{} @{} options={:?}",
            init.width,
            init.height,
            init.pixel_ratio,
            init.options
        );

        Self {
            gl,
            width: init.width,
            height: init.height,
            pixel_ratio: init.pixel_ratio,
            programs: HashMap::new(),
            geometries: HashMap::new(),
            attributes: AttributeLayouts::default(),
            textures: HashMap::new(),
            targets: HashMap::new(),
            bound: BoundState::default(),
            warned_uniforms: HashSet::new(),
        }
    }

    /// Handles a surface resize.
    ///
    /// Offscreen attachments are re-specified at the new size and the bound
    /// target is forgotten, so the next target switch applies the new
    /// viewport. A zero-sized surface only records the size.
    pub fn resize(&mut self, args: ResizeArgs) {
        self.width = args.width;
        self.height = args.height;
        self.bound.target.invalidate();

        if args.width == 0 || args.height == 0 {
            return;
        }
        self.reallocate_targets();
    }

    /// Changes the pixel ratio; offscreen attachments follow as on resize.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        if self.pixel_ratio == pixel_ratio {
            return;
        }
        self.pixel_ratio = pixel_ratio;
        self.resize(ResizeArgs { width: self.width, height: self.height });
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Surface size in physical pixels.
    pub fn physical_size(&self) -> (i32, i32) {
        scaled(self.width, self.height, self.pixel_ratio)
    }

    #[inline]
    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// Direct driver access. Binding objects through it bypasses the
    /// bound-state cells; call [`invalidate_bindings`](Self::invalidate_bindings) afterwards.
    #[inline]
    pub fn gl_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    #[inline]
    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    /// Forgets every bound id; the next `use_*` call of each kind rebinds.
    pub fn invalidate_bindings(&mut self) {
        self.bound.invalidate_all();
    }

    /// Resolved layout of attribute `name`, if any program declared it.
    #[inline]
    pub fn attribute_layout(&self, name: &str) -> Option<AttributeLayout> {
        self.attributes.get(name)
    }

    /// Clears color and/or depth of the currently bound target.
    pub fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
        self.gl.clear(color, depth);
    }
}

/// Logical size times pixel ratio, rounded to whole pixels.
pub(crate) fn scaled(width: u32, height: u32, pixel_ratio: f32) -> (i32, i32) {
    (
        (width as f32 * pixel_ratio).round() as i32,
        (height as f32 * pixel_ratio).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{Call, Capability, RecordingGl, TextureFormat};
    use crate::target::RenderTargetDesc;

    #[test]
    fn options_are_enabled_once_at_construction() {
        let init = ContextInit {
            options: vec![Capability::DepthTest, Capability::CullFace],
            ..Default::default()
        };
        let ctx = Context::new(RecordingGl::new(), init);
        assert_eq!(
            ctx.gl().calls(),
            &[Call::Enable(Capability::DepthTest), Call::Enable(Capability::CullFace)]
        );
    }

    #[test]
    fn resize_updates_size_and_forgets_target() {
        let mut ctx = Context::new(RecordingGl::new(), ContextInit::default());
        ctx.bound.target.transition("main");
        ctx.resize(ResizeArgs { width: 640, height: 480 });
        assert_eq!((ctx.width(), ctx.height()), (640, 480));
        assert_eq!(ctx.bound().target.get(), None);
    }

    #[test]
    fn pixel_ratio_change_resizes_attachments_and_forgets_target() {
        let mut ctx = Context::new(RecordingGl::new(), ContextInit { width: 100, height: 50, ..Default::default() });
        let desc = RenderTargetDesc::Offscreen { color: vec![TextureFormat::Rgba8], depth: None };
        ctx.create_render_target("scene", &desc).unwrap();
        ctx.bind_render_target("scene").unwrap();
        ctx.gl_mut().take_calls();

        ctx.set_pixel_ratio(2.0);
        assert_eq!(ctx.physical_size(), (200, 100));
        assert_eq!(
            ctx.gl().count(|c| *c == Call::TexImage2d { width: 200, height: 100, format: TextureFormat::Rgba8 }),
            1
        );
        assert_eq!(ctx.bound().target.get(), None);

        ctx.gl_mut().take_calls();
        ctx.set_pixel_ratio(2.0);
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn physical_size_rounds() {
        let init = ContextInit { width: 101, height: 50, pixel_ratio: 1.5, ..Default::default() };
        let ctx = Context::new(RecordingGl::new(), init);
        assert_eq!(ctx.physical_size(), (152, 75));
    }

    #[test]
    fn clear_forwards_to_driver() {
        let mut ctx = Context::new(RecordingGl::new(), ContextInit::default());
        ctx.clear(Some([0.0, 0.0, 0.0, 1.0]), Some(1.0));
        assert_eq!(
            ctx.gl().calls(),
            &[Call::Clear { color: Some([0.0, 0.0, 0.0, 1.0]), depth: Some(1.0) }]
        );
    }
}
