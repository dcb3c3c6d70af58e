// Sprite sheets and frame selection rules.

use super::state::AnimState;
use std::collections::HashMap;
use std::sync::Arc;

/// Display ticks each animation frame stays on screen.
pub const SLOW_FACTOR: u64 = 10;

/// Opaque drawable. The surface decides what the key refers to (path, texture id, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle(Arc<str>);

impl ImageHandle {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

/// Horizontal strip of equally sized frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    frame_count: u32,
    frame_width: u32,
    frame_height: u32,
    image: ImageHandle,
}

impl SpriteSheet {
    /// Returns `None` for a sheet without frames or with an empty frame size.
    pub fn new(
        image: ImageHandle,
        frame_count: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        if frame_count == 0 || frame_width == 0 || frame_height == 0 {
            return None;
        }
        Some(Self {
            frame_count,
            frame_width,
            frame_height,
            image,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }
}

/// Why a state could not be drawn with its own sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableMissing {
    // Absent or unrecognised state name.
    UnknownState,
    UnloadedSheet(AnimState),
}

/// Sheet set keyed by animation state. Idle is mandatory and backs every missing state.
#[derive(Debug, Clone)]
pub struct SpriteSheets {
    idle: SpriteSheet,
    others: HashMap<AnimState, SpriteSheet>,
}

impl SpriteSheets {
    pub fn new(idle: SpriteSheet) -> Self {
        Self {
            idle,
            others: HashMap::new(),
        }
    }

    pub fn with(mut self, state: AnimState, sheet: SpriteSheet) -> Self {
        match state {
            AnimState::Idle => self.idle = sheet,
            other => {
                self.others.insert(other, sheet);
            }
        }
        self
    }

    /// Built-in table matching the shipped player assets.
    pub fn builtin() -> Self {
        let sheet = |path: &str, frames: u32| SpriteSheet {
            frame_count: frames,
            frame_width: 50,
            frame_height: 50,
            image: ImageHandle::new(path),
        };

        Self::new(sheet("assets/player/idle.png", 4))
            .with(AnimState::Running, sheet("assets/player/run.png", 6))
            .with(AnimState::Jumping, sheet("assets/player/jump.png", 2))
            .with(AnimState::Attacking, sheet("assets/player/attack.png", 3))
    }

    /// Exact sheet for a state, without fallback.
    pub fn lookup(&self, state: Option<AnimState>) -> Result<&SpriteSheet, RenderableMissing> {
        match state {
            None => Err(RenderableMissing::UnknownState),
            Some(AnimState::Idle) => Ok(&self.idle),
            Some(other) => self
                .others
                .get(&other)
                .ok_or(RenderableMissing::UnloadedSheet(other)),
        }
    }

    /// Sheet for a state, falling back to idle for unknown states and unloaded sheets.
    pub fn get(&self, state: Option<AnimState>) -> &SpriteSheet {
        self.lookup(state).unwrap_or_else(|missing| {
            tracing::trace!(?missing, "sprite sheet unavailable; using idle");
            &self.idle
        })
    }

    pub fn idle(&self) -> &SpriteSheet {
        &self.idle
    }
}

/// Render tick counter shared by every entity of one view.
///
/// All states index off the same counter, so a player switching state resumes mid-cycle
/// instead of restarting at frame 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationCursor(u64);

impl AnimationCursor {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn frame_index(self, frame_count: u32) -> u32 {
        let frames = u64::from(frame_count.max(1));
        ((self.0 / SLOW_FACTOR) % frames) as u32
    }
}

/// Two-way facing heuristic: anything pointing into the left half-plane is mirrored.
pub fn is_flipped(facing: Option<f32>) -> bool {
    match facing {
        Some(deg) => (deg > 90.0 && deg < 270.0) || deg == 180.0,
        None => false,
    }
}
