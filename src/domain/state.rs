// Domain-level snapshot of the server-authoritative game state.

/// Animation category of a player as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimState {
    Idle,
    Running,
    Jumping,
    Attacking,
}

impl AnimState {
    pub const ALL: [AnimState; 4] = [
        AnimState::Idle,
        AnimState::Running,
        AnimState::Jumping,
        AnimState::Attacking,
    ];

    /// Parses the wire name; unknown names have no state.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(AnimState::Idle),
            "running" => Some(AnimState::Running),
            "jumping" => Some(AnimState::Jumping),
            "attacking" => Some(AnimState::Attacking),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnimState::Idle => "idle",
            AnimState::Running => "running",
            AnimState::Jumping => "jumping",
            AnimState::Attacking => "attacking",
        }
    }
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One player as seen in a snapshot. Absent wire fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerView {
    pub x: Option<f32>,
    pub y: Option<f32>,
    // Degrees; only used for the mirror decision.
    pub facing: Option<f32>,
    // `None` when missing or not a known state name.
    pub state: Option<AnimState>,
    pub lives: Option<u32>,
    pub is_alive: bool,
}

impl PlayerView {
    /// Top-left corner of the sprite, if the server sent both coordinates.
    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.x?, self.y?))
    }
}

/// Full game state. Replaced wholesale on every inbound message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    // Kept in wire order; the local player fallback depends on it.
    pub players: Vec<(String, PlayerView)>,
    pub platforms: Vec<Rect>,
    pub game_started: bool,
    pub time_remaining: Option<u32>,
}

impl Snapshot {
    pub fn player(&self, id: &str) -> Option<&PlayerView> {
        self.players
            .iter()
            .find(|(pid, _)| pid == id)
            .map(|(_, player)| player)
    }

    /// Resolves the local player.
    ///
    /// An explicit id wins. Without one the first entry of the mapping is used; that is only a
    /// placeholder until the server announces identities.
    pub fn local_player(&self, explicit_id: Option<&str>) -> Option<(&str, &PlayerView)> {
        match explicit_id {
            Some(id) => self
                .players
                .iter()
                .find(|(pid, _)| pid == id)
                .map(|(pid, player)| (pid.as_str(), player)),
            None => self
                .players
                .first()
                .map(|(pid, player)| (pid.as_str(), player)),
        }
    }
}
