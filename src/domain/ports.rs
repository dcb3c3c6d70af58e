use super::animation::ImageHandle;
use super::intent::Intent;
use super::state::Rect;

/// Source crop inside a sprite sheet image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Where a sprite lands. `scale_x` is -1.0 for a mirrored draw whose origin is the right edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin_x: f32,
    pub origin_y: f32,
    pub scale_x: f32,
}

impl Placement {
    /// Horizontal span covered on the surface for a frame of the given width.
    pub fn span_x(&self, width: f32) -> (f32, f32) {
        let end = self.origin_x + self.scale_x * width;
        (self.origin_x.min(end), self.origin_x.max(end))
    }
}

/// Text colour and font, kept as CSS-like strings so any backend can map them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: &'static str,
    pub font: &'static str,
}

// Port for the 2-D drawing surface used by the render engine.
pub trait Surface {
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: &'static str);
    fn draw_sprite(&mut self, image: &ImageHandle, source: SourceRect, placement: Placement);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);
}

// Port for outbound intents. Implementations must not block and must not fail loudly.
pub trait IntentSink {
    fn send(&self, intent: Intent);
}
