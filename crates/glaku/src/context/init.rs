use crate::gl::Capability;

/// Construction parameters for a [`Context`](super::Context).
#[derive(Debug, Clone)]
pub struct ContextInit {
    /// Surface size in logical pixels.
    pub width: u32,
    pub height: u32,

    /// Physical pixels per logical pixel.
    pub pixel_ratio: f32,

    /// Capabilities enabled once at construction (e.g. depth test, culling).
    pub options: Vec<Capability>,
}

impl Default for ContextInit {
    fn default() -> Self {
        Self {
            width: 300,
            height: 150,
            pixel_ratio: 1.0,
            options: Vec::new(),
        }
    }
}

/// Payload of a surface resize notification, in logical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResizeArgs {
    pub width: u32,
    pub height: u32,
}
