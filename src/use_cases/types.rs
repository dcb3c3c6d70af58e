// Use-case level inputs for the client loop.

/// Keys the client reacts to, named after their DOM `key` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    Space,
    Enter,
}

impl Key {
    pub fn from_dom(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            "ArrowUp" => Some(Key::ArrowUp),
            " " | "Space" | "Spacebar" => Some(Key::Space),
            "Enter" => Some(Key::Enter),
            _ => None,
        }
    }

    pub(crate) fn is_horizontal(self) -> bool {
        matches!(self, Key::ArrowLeft | Key::ArrowRight)
    }
}

/// Raw device events, including auto-repeated key downs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    // Surface-local pointer coordinates.
    PointerMove { x: f32, y: f32 },
    // Window/canvas lost focus; key ups will not arrive.
    FocusLost,
    // External start control (button click).
    StartPressed,
}
