// Headless surface that records draw calls instead of rasterizing them.

use crate::domain::{ImageHandle, Placement, Rect, SourceRect, Surface, TextStyle};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: Rect,
        color: &'static str,
    },
    Sprite {
        image: ImageHandle,
        source: SourceRect,
        placement: Placement,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
}

/// Draw list for the current frame. `clear` starts a new frame.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn sprites(&self) -> Vec<(&ImageHandle, SourceRect, Placement)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Sprite {
                    image,
                    source,
                    placement,
                } => Some((image, *source, *placement)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for CommandBuffer {
    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: &'static str) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_sprite(&mut self, image: &ImageHandle, source: SourceRect, placement: Placement) {
        self.commands.push(DrawCommand::Sprite {
            image: image.clone(),
            source,
            placement,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            style,
        });
    }
}
