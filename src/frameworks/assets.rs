// Sprite sheet table loaded once at startup from an optional TOML manifest.
//
//   [idle]
//   image = "assets/player/idle.png"
//   frames = 4
//   frame_width = 50
//   frame_height = 50

use crate::domain::{AnimState, ImageHandle, SpriteSheet, SpriteSheets};
use serde::Deserialize;
use std::{fmt, path::Path};
use tracing::{info, warn};

#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(toml::de::Error),
    MissingIdle,
    InvalidSheet(AnimState),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "cannot read sprite manifest: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid sprite manifest: {e}"),
            ConfigError::MissingIdle => f.write_str("sprite manifest has no idle sheet"),
            ConfigError::InvalidSheet(state) => {
                write!(f, "sheet `{}` needs frames and a non-empty size", state.as_str())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    image: String,
    frames: u32,
    frame_width: u32,
    frame_height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpriteManifest {
    idle: Option<SheetEntry>,
    running: Option<SheetEntry>,
    jumping: Option<SheetEntry>,
    attacking: Option<SheetEntry>,
}

impl SpriteManifest {
    fn entry(&self, state: AnimState) -> Option<&SheetEntry> {
        match state {
            AnimState::Idle => self.idle.as_ref(),
            AnimState::Running => self.running.as_ref(),
            AnimState::Jumping => self.jumping.as_ref(),
            AnimState::Attacking => self.attacking.as_ref(),
        }
    }
}

fn build_sheet(state: AnimState, entry: &SheetEntry) -> Result<SpriteSheet, ConfigError> {
    SpriteSheet::new(
        ImageHandle::new(entry.image.as_str()),
        entry.frames,
        entry.frame_width,
        entry.frame_height,
    )
    .ok_or(ConfigError::InvalidSheet(state))
}

/// Parses a manifest. States without an entry fall back to idle at draw time.
pub fn parse_manifest(text: &str) -> Result<SpriteSheets, ConfigError> {
    let manifest: SpriteManifest = toml::from_str(text).map_err(ConfigError::Parse)?;

    let idle_entry = manifest.entry(AnimState::Idle).ok_or(ConfigError::MissingIdle)?;
    let mut sheets = SpriteSheets::new(build_sheet(AnimState::Idle, idle_entry)?);

    for state in AnimState::ALL {
        if state == AnimState::Idle {
            continue;
        }
        if let Some(entry) = manifest.entry(state) {
            sheets = sheets.with(state, build_sheet(state, entry)?);
        }
    }
    Ok(sheets)
}

pub fn load_manifest(path: &Path) -> Result<SpriteSheets, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
    parse_manifest(&text)
}

/// Sheets for this process: the manifest if one is configured and valid, else the built-in table.
pub fn load_sprite_sheets(path: Option<&Path>) -> SpriteSheets {
    let Some(path) = path else {
        return SpriteSheets::builtin();
    };

    match load_manifest(path) {
        Ok(sheets) => {
            info!(path = %path.display(), "sprite manifest loaded");
            sheets
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "using built-in sprite sheets");
            SpriteSheets::builtin()
        }
    }
}
