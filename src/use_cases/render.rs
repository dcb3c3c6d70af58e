// Per-tick drawing of the latest snapshot.

use crate::domain::{
    AnimationCursor, Placement, Snapshot, SourceRect, SpriteSheets, Surface, TextStyle, is_flipped,
};

/// Fixed positions and styles for everything that is not a sprite.
#[derive(Debug, Clone)]
pub struct HudLayout {
    pub platform_color: &'static str,
    pub lives_style: TextStyle,
    // Lives text baseline sits this far above the sprite's top edge.
    pub lives_offset_y: f32,
    pub timer_style: TextStyle,
    pub timer_position: (f32, f32),
    pub banner_style: TextStyle,
    pub banner_position: (f32, f32),
    pub banner_text: &'static str,
}

impl Default for HudLayout {
    fn default() -> Self {
        Self {
            platform_color: "darkgreen",
            lives_style: TextStyle {
                color: "white",
                font: "14px Arial",
            },
            lives_offset_y: 10.0,
            timer_style: TextStyle {
                color: "black",
                font: "20px Arial",
            },
            timer_position: (650.0, 30.0),
            banner_style: TextStyle {
                color: "red",
                font: "20px Arial",
            },
            banner_position: (280.0, 300.0),
            banner_text: "Game not started or round ended",
        }
    }
}

/// Draws snapshots and owns the animation cursor of one view.
#[derive(Debug)]
pub struct RenderEngine {
    sheets: SpriteSheets,
    cursor: AnimationCursor,
    hud: HudLayout,
}

impl RenderEngine {
    pub fn new(sheets: SpriteSheets) -> Self {
        Self::with_layout(sheets, HudLayout::default())
    }

    pub fn with_layout(sheets: SpriteSheets, hud: HudLayout) -> Self {
        Self {
            sheets,
            cursor: AnimationCursor::new(),
            hud,
        }
    }

    pub fn cursor(&self) -> AnimationCursor {
        self.cursor
    }

    /// Draws one frame and advances the cursor.
    ///
    /// Without a surface nothing is drawn and the cursor stays put.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: Option<&mut S>, snapshot: &Snapshot) {
        let Some(surface) = surface else {
            return;
        };

        surface.clear();

        for platform in &snapshot.platforms {
            surface.fill_rect(*platform, self.hud.platform_color);
        }

        for (_, player) in snapshot.players.iter().filter(|(_, p)| p.is_alive) {
            // Without both coordinates there is nowhere to draw.
            let Some((x, y)) = player.position() else {
                continue;
            };

            let sheet = self.sheets.get(player.state);
            let frame_index = self.cursor.frame_index(sheet.frame_count());
            let width = sheet.frame_width() as f32;
            let source = SourceRect {
                x: frame_index as f32 * width,
                y: 0.0,
                w: width,
                h: sheet.frame_height() as f32,
            };
            let placement = if is_flipped(player.facing) {
                Placement {
                    origin_x: x + width,
                    origin_y: y,
                    scale_x: -1.0,
                }
            } else {
                Placement {
                    origin_x: x,
                    origin_y: y,
                    scale_x: 1.0,
                }
            };
            surface.draw_sprite(sheet.image(), source, placement);

            if let Some(lives) = player.lives {
                surface.fill_text(
                    &format!("Lives: {lives}"),
                    x,
                    y - self.hud.lives_offset_y,
                    self.hud.lives_style,
                );
            }
        }

        if snapshot.game_started {
            let text = match snapshot.time_remaining {
                Some(seconds) => format!("Time: {seconds}s"),
                None => "Time: --".to_string(),
            };
            let (tx, ty) = self.hud.timer_position;
            surface.fill_text(&text, tx, ty, self.hud.timer_style);
        } else {
            let (bx, by) = self.hud.banner_position;
            surface.fill_text(self.hud.banner_text, bx, by, self.hud.banner_style);
        }

        self.cursor.advance();
    }
}
