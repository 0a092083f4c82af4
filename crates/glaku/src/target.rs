//! Render targets: the default surface or offscreen framebuffers with
//! texture attachments, and the elided target switch.

use crate::context::{scaled, Context};
use crate::error::{allocated, Error, ResourceKind, Result};
use crate::gl::{Attachment, DrawBuffer, GlBackend, TextureFilter, TextureFormat};
use crate::texture::TextureDesc;

/// What a registered render target draws into.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTargetDesc {
    /// The window's default framebuffer.
    Surface,
    /// A framebuffer with one texture per listed format, sized to the
    /// surface times the pixel ratio.
    Offscreen {
        color: Vec<TextureFormat>,
        depth: Option<TextureFormat>,
    },
}

pub(crate) struct TargetAttachment<T> {
    pub point: Attachment,
    pub format: TextureFormat,
    pub texture: T,
}

pub(crate) struct RenderTargetEntry<G: GlBackend> {
    /// `None` for the default framebuffer.
    pub framebuffer: Option<G::Framebuffer>,
    pub attachments: Vec<TargetAttachment<G::Texture>>,
    pub draw_buffers: Vec<DrawBuffer>,
}

impl<G: GlBackend> Context<G> {
    /// Switches output to target `id` unless it is already current.
    ///
    /// On an actual switch binds `framebuffer` (`None` is the default
    /// framebuffer), routes fragment outputs to `draw_buffers`, and sets the
    /// viewport to `width * pixel_ratio` by `height * pixel_ratio`.
    pub fn use_render_target(
        &mut self,
        id: &str,
        framebuffer: Option<&G::Framebuffer>,
        width: u32,
        height: u32,
        pixel_ratio: f32,
        draw_buffers: &[DrawBuffer],
    ) {
        if !self.bound.target.transition(id) {
            return;
        }
        self.gl.bind_framebuffer(framebuffer);
        self.gl.draw_buffers(draw_buffers);
        let (w, h) = scaled(width, height, pixel_ratio);
        self.gl.viewport(0, 0, w, h);
    }

    /// Registers a render target under `id`.
    ///
    /// Offscreen attachments use linear filtering so they can be sampled by
    /// later passes through [`render_target_texture`](Self::render_target_texture).
    pub fn create_render_target(&mut self, id: &str, desc: &RenderTargetDesc) -> Result<()> {
        let entry = match desc {
            RenderTargetDesc::Surface => RenderTargetEntry {
                framebuffer: None,
                attachments: Vec::new(),
                draw_buffers: vec![DrawBuffer::Back],
            },
            RenderTargetDesc::Offscreen { color, depth } => self.build_offscreen(id, color, *depth)?,
        };

        if self.targets.insert(id.to_string(), entry).is_some() {
            log::debug!("render target `{id}` redefined");
            if self.bound.target.get() == Some(id) {
                self.bound.target.invalidate();
            }
        }
        log::debug!("render target `{id}` created");
        Ok(())
    }

    /// Switches to registered target `id` at the current surface size.
    pub fn bind_render_target(&mut self, id: &str) -> Result<()> {
        let entry = self
            .targets
            .get(id)
            .ok_or_else(|| Error::UnknownRenderTarget(id.to_string()))?;
        let framebuffer = entry.framebuffer.clone();
        let draw_buffers = entry.draw_buffers.clone();

        let (width, height, pixel_ratio) = (self.width, self.height, self.pixel_ratio);
        self.use_render_target(id, framebuffer.as_ref(), width, height, pixel_ratio, &draw_buffers);
        Ok(())
    }

    /// Texture behind color attachment `index` of target `id`.
    pub fn render_target_texture(&self, id: &str, index: u32) -> Option<G::Texture> {
        self.targets
            .get(id)?
            .attachments
            .iter()
            .find(|a| a.point == Attachment::Color(index))
            .map(|a| a.texture.clone())
    }

    #[inline]
    pub fn has_render_target(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    /// Re-specifies every offscreen attachment at the current physical size.
    pub(crate) fn reallocate_targets(&mut self) {
        let (w, h) = self.physical_size();
        for target in self.targets.values() {
            for attachment in &target.attachments {
                self.gl.bind_texture_2d(Some(&attachment.texture));
                self.gl.tex_image_2d(w, h, attachment.format, None);
            }
        }
        self.gl.bind_texture_2d(None);
        log::debug!("render targets resized to {w}x{h}");
    }

    fn build_offscreen(
        &mut self,
        id: &str,
        color: &[TextureFormat],
        depth: Option<TextureFormat>,
    ) -> Result<RenderTargetEntry<G>> {
        let (w, h) = self.physical_size();
        let mut points: Vec<(Attachment, TextureFormat)> = color
            .iter()
            .enumerate()
            .map(|(i, format)| (Attachment::Color(i as u32), *format))
            .collect();
        if let Some(format) = depth {
            points.push((Attachment::Depth, format));
        }

        let mut attachments = Vec::with_capacity(points.len());
        for (point, format) in points {
            if format.is_depth() != (point == Attachment::Depth) {
                return Err(Error::IncompleteFramebuffer(id.to_string()));
            }
            let desc = TextureDesc {
                width: w.max(1) as u32,
                height: h.max(1) as u32,
                format,
                filter: TextureFilter::Linear,
            };
            let texture = self.create_texture(&desc, None)?;
            attachments.push(TargetAttachment { point, format, texture });
        }

        let framebuffer = allocated(ResourceKind::Framebuffer, self.gl.create_framebuffer())?;
        self.gl.bind_framebuffer(Some(&framebuffer));
        // The driver binding moved away from whatever target was current.
        self.bound.target.invalidate();
        for attachment in &attachments {
            self.gl.framebuffer_texture_2d(attachment.point, &attachment.texture);
        }
        let complete = self.gl.framebuffer_complete();
        self.gl.bind_framebuffer(None);

        if !complete {
            return Err(Error::IncompleteFramebuffer(id.to_string()));
        }

        Ok(RenderTargetEntry {
            framebuffer: Some(framebuffer),
            attachments,
            draw_buffers: (0..color.len() as u32).map(DrawBuffer::Color).collect(),
        })
    }
}
