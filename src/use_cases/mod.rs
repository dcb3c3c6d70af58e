// Use cases layer: input mapping, rendering and the client loop.

pub mod input;
pub mod render;
pub mod session;
pub mod types;

pub use input::InputMapper;
pub use render::{HudLayout, RenderEngine};
pub use session::{Session, SessionStats, run_session};
pub use types::{InputEvent, Key};
