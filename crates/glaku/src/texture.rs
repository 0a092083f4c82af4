//! Texture allocation and texture-unit assignment.

use crate::context::Context;
use crate::error::{allocated, ResourceKind, Result};
use crate::gl::{GlBackend, TextureFilter, TextureFormat};

pub(crate) struct TextureSlot<T> {
    pub handle: T,
    pub unit: u32,
}

/// Storage description of a 2D texture.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: TextureFilter,
}

impl<G: GlBackend> Context<G> {
    /// Allocates a 2D texture with clamp-to-edge wrapping.
    ///
    /// `pixels`, when given, must match `desc.format`; `None` leaves the
    /// storage uninitialized.
    pub fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<G::Texture> {
        let texture = allocated(ResourceKind::Texture, self.gl.create_texture())?;
        self.gl.bind_texture_2d(Some(&texture));
        self.gl
            .tex_image_2d(desc.width as i32, desc.height as i32, desc.format, pixels);
        self.gl.tex_sampling(desc.filter);
        self.gl.bind_texture_2d(None);
        Ok(texture)
    }

    /// Registers `handle` under `key` and returns its texture unit.
    ///
    /// A known key keeps its unit and only swaps the handle; a new key gets
    /// the next unit. Units are never reclaimed, and staying under the
    /// driver's unit limit is up to the caller.
    pub fn set_texture(&mut self, key: &str, handle: G::Texture) -> u32 {
        if let Some(slot) = self.textures.get_mut(key) {
            slot.handle = handle;
            return slot.unit;
        }
        let unit = self.textures.len() as u32;
        self.textures.insert(key.to_string(), TextureSlot { handle, unit });
        unit
    }

    /// Activates the unit of `key` and binds its texture there.
    pub fn use_texture(&mut self, key: &str) {
        let Some(slot) = self.textures.get(key) else {
            log::error!("use_texture: no texture registered under `{key}`");
            return;
        };
        self.gl.active_texture(slot.unit);
        self.gl.bind_texture_2d(Some(&slot.handle));
    }

    #[inline]
    pub fn texture_unit(&self, key: &str) -> Option<u32> {
        self.textures.get(key).map(|slot| slot.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextInit;
    use crate::gl::{Call, Handle, RecordingGl};

    fn ctx() -> Context<RecordingGl> {
        Context::new(RecordingGl::new(), ContextInit::default())
    }

    #[test]
    fn replacing_a_handle_keeps_the_unit() {
        let mut ctx = ctx();
        let first = ctx.set_texture("albedo", Handle(10));
        let second = ctx.set_texture("albedo", Handle(11));
        assert_eq!(first, second);

        ctx.use_texture("albedo");
        assert_eq!(ctx.gl().calls(), &[Call::ActiveTexture(first), Call::BindTexture2d(Some(Handle(11)))]);
    }

    #[test]
    fn distinct_keys_get_increasing_units() {
        let mut ctx = ctx();
        let units: Vec<_> = ["a", "b", "a", "c"]
            .iter()
            .map(|k| ctx.set_texture(k, Handle(1)))
            .collect();
        assert_eq!(units, vec![0, 1, 0, 2]);
        assert_eq!(ctx.texture_unit("c"), Some(2));
        assert_eq!(ctx.texture_unit("d"), None);
    }

    #[test]
    fn unknown_key_binds_nothing() {
        let mut ctx = ctx();
        ctx.use_texture("missing");
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn create_texture_specifies_storage_and_sampling() {
        let mut ctx = ctx();
        let desc = TextureDesc {
            width: 64,
            height: 32,
            format: TextureFormat::Rgba16F,
            filter: TextureFilter::Nearest,
        };
        let texture = ctx.create_texture(&desc, None).unwrap();
        assert_eq!(
            ctx.gl().calls(),
            &[
                Call::CreateTexture(texture),
                Call::BindTexture2d(Some(texture)),
                Call::TexImage2d { width: 64, height: 32, format: TextureFormat::Rgba16F },
                Call::TexSampling(TextureFilter::Nearest),
                Call::BindTexture2d(None),
            ]
        );
    }
}
