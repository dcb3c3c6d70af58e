use crate::interface_adapters::protocol::ProtocolVariant;
use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

// Runtime/client constants (not presentation tuning).

pub fn server_url() -> String {
    env::var("GAME_SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:6789".to_string())
}

pub fn frame_interval() -> Duration {
    let millis = env::var("FRAME_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(16);
    Duration::from_millis(millis)
}

// Server-assigned identity for the local player; unset falls back to the first snapshot entry.
pub fn player_id() -> Option<String> {
    env::var("PLAYER_ID")
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

pub fn protocol_variant() -> ProtocolVariant {
    match env::var("PROTOCOL_VARIANT") {
        Ok(value) => ProtocolVariant::parse(&value).unwrap_or_else(|| {
            warn!(%value, "unknown PROTOCOL_VARIANT; using extended");
            ProtocolVariant::Extended
        }),
        Err(_) => ProtocolVariant::Extended,
    }
}

pub fn sprite_manifest() -> Option<PathBuf> {
    env::var_os("SPRITE_MANIFEST").map(PathBuf::from)
}

pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;
pub const INPUT_CHANNEL_CAPACITY: usize = 256;
