// Discrete client actions sent to the server.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
}

/// Client intent. Carries no identity; the server knows the sender from the connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Move(Direction),
    StopMove(Axis),
    // Degrees from the local player's centre towards the pointer, when known.
    Attack(Option<f32>),
    StartGame,
}
