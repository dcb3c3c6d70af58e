// Domain layer: snapshot model, animation rules and intents.

pub mod animation;
pub mod intent;
pub mod ports;
pub mod state;

pub use animation::{
    AnimationCursor, ImageHandle, RenderableMissing, SLOW_FACTOR, SpriteSheet, SpriteSheets,
    is_flipped,
};
pub use intent::{Axis, Direction, Intent};
pub use ports::{IntentSink, Placement, SourceRect, Surface, TextStyle};
pub use state::{AnimState, PlayerView, Rect, Snapshot};
