// Wire protocol DTOs and conversions for the game server WebSocket.

use crate::domain::{AnimState, Axis, Direction, Intent, PlayerView, Rect, Snapshot};
use serde::de::value::MapAccessDeserializer;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::{fmt, marker::PhantomData};
use tracing::trace;

/// Whether ATTACK carries the pointer angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVariant {
    // Older servers: ATTACK has no payload.
    Minimal,
    #[default]
    Extended,
}

impl ProtocolVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(ProtocolVariant::Minimal),
            "extended" => Some(ProtocolVariant::Extended),
            _ => None,
        }
    }
}

/// Inbound payload that could not be turned into a snapshot.
#[derive(Debug)]
pub struct ProtocolError(serde_json::Error);

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed snapshot: {}", self.0)
    }
}

impl std::error::Error for ProtocolError {}

/// Messages the client sends to the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentDto {
    Move {
        direction: DirectionDto,
    },
    StopMove {
        axis: AxisDto,
    },
    Attack {
        #[serde(skip_serializing_if = "Option::is_none")]
        angle: Option<f32>,
    },
    StartGame,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDto {
    Left,
    Right,
    Jump,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisDto {
    X,
}

impl IntentDto {
    pub fn from_intent(intent: Intent, variant: ProtocolVariant) -> Self {
        match intent {
            Intent::Move(direction) => IntentDto::Move {
                direction: match direction {
                    Direction::Left => DirectionDto::Left,
                    Direction::Right => DirectionDto::Right,
                    Direction::Jump => DirectionDto::Jump,
                },
            },
            Intent::StopMove(Axis::X) => IntentDto::StopMove { axis: AxisDto::X },
            Intent::Attack(angle) => IntentDto::Attack {
                angle: match variant {
                    ProtocolVariant::Minimal => None,
                    // JSON has no NaN; drop it rather than fail the send.
                    ProtocolVariant::Extended => angle.filter(|a| a.is_finite()),
                },
            },
            Intent::StartGame => IntentDto::StartGame,
        }
    }
}

/// Serializes an intent to its JSON text frame.
pub fn encode_intent(
    intent: Intent,
    variant: ProtocolVariant,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&IntentDto::from_intent(intent, variant))
}

/// Parses a full snapshot. Nothing is applied unless the whole payload is valid.
pub fn decode_snapshot(text: &str) -> Result<Snapshot, ProtocolError> {
    serde_json::from_str::<Object<SnapshotDto>>(text)
        .map(|Object(dto)| Snapshot::from(dto))
        .map_err(ProtocolError)
}

/// Snapshot as sent by the server. Every field may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    #[serde(default)]
    pub players: Option<OrderedPlayers>,
    #[serde(default)]
    pub platforms: Option<Vec<Object<RectDto>>>,
    #[serde(default)]
    pub game_started: Option<bool>,
    #[serde(default)]
    pub time_remaining: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub facing: Option<f32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub lives: Option<u32>,
    #[serde(default)]
    pub is_alive: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RectDto {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// A DTO that must arrive as a JSON object.
///
/// Derived struct impls also accept arrays in field order, which would let `[]` pass as an
/// empty snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Object<T>(pub T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Object<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ObjectVisitor<T> {
            type Value = Object<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                T::deserialize(MapAccessDeserializer::new(map)).map(Object)
            }
        }

        deserializer.deserialize_map(ObjectVisitor(PhantomData))
    }
}

/// Player map that keeps the order the server wrote the keys in.
#[derive(Debug, Clone, Default)]
pub struct OrderedPlayers(pub Vec<(String, PlayerDto)>);

impl<'de> Deserialize<'de> for OrderedPlayers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlayersVisitor;

        impl<'de> Visitor<'de> for PlayersVisitor {
            type Value = OrderedPlayers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of player id to player state")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut players = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, player)) = map.next_entry::<String, Object<PlayerDto>>()? {
                    // Duplicate keys: the later entry wins, in the earlier slot.
                    match players.iter_mut().find(|(pid, _)| *pid == id) {
                        Some(slot) => slot.1 = player.0,
                        None => players.push((id, player.0)),
                    }
                }
                Ok(OrderedPlayers(players))
            }
        }

        deserializer.deserialize_map(PlayersVisitor)
    }
}

impl From<PlayerDto> for PlayerView {
    fn from(dto: PlayerDto) -> Self {
        let state = dto.state.as_deref().and_then(|name| {
            let parsed = AnimState::from_wire(name);
            if parsed.is_none() {
                trace!(state = name, "unknown animation state");
            }
            parsed
        });
        Self {
            x: dto.x,
            y: dto.y,
            facing: dto.facing,
            state,
            lives: dto.lives,
            is_alive: dto.is_alive.unwrap_or(false),
        }
    }
}

impl From<RectDto> for Rect {
    fn from(dto: RectDto) -> Self {
        Self {
            x: dto.x,
            y: dto.y,
            w: dto.w,
            h: dto.h,
        }
    }
}

impl From<SnapshotDto> for Snapshot {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            players: dto
                .players
                .unwrap_or_default()
                .0
                .into_iter()
                .map(|(id, player)| (id, PlayerView::from(player)))
                .collect(),
            platforms: dto
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|Object(rect)| Rect::from(rect))
                .collect(),
            game_started: dto.game_started.unwrap_or(false),
            time_remaining: dto.time_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn encoded(intent: Intent, variant: ProtocolVariant) -> Value {
        let text = encode_intent(intent, variant).expect("intent serializes");
        serde_json::from_str(&text).expect("valid json")
    }

    #[test]
    fn when_intents_are_encoded_then_wire_shapes_match_the_server() {
        let extended = ProtocolVariant::Extended;
        assert_eq!(
            encoded(Intent::Move(Direction::Right), extended),
            json!({"type": "MOVE", "direction": "right"})
        );
        assert_eq!(
            encoded(Intent::Move(Direction::Jump), extended),
            json!({"type": "MOVE", "direction": "jump"})
        );
        assert_eq!(
            encoded(Intent::StopMove(Axis::X), extended),
            json!({"type": "STOP_MOVE", "axis": "x"})
        );
        assert_eq!(
            encoded(Intent::StartGame, extended),
            json!({"type": "START_GAME"})
        );
        assert_eq!(
            encoded(Intent::Attack(Some(45.0)), extended),
            json!({"type": "ATTACK", "angle": 45.0})
        );
        assert_eq!(
            encoded(Intent::Attack(None), extended),
            json!({"type": "ATTACK"})
        );
    }

    #[test]
    fn when_variant_is_minimal_then_attack_angle_is_omitted() {
        assert_eq!(
            encoded(Intent::Attack(Some(45.0)), ProtocolVariant::Minimal),
            json!({"type": "ATTACK"})
        );
    }

    #[test]
    fn when_move_right_is_encoded_then_text_is_exact() {
        let text = encode_intent(Intent::Move(Direction::Right), ProtocolVariant::Extended)
            .expect("intent serializes");
        assert_eq!(text, r#"{"type":"MOVE","direction":"right"}"#);

        let text = encode_intent(Intent::StopMove(Axis::X), ProtocolVariant::Extended)
            .expect("intent serializes");
        assert_eq!(text, r#"{"type":"STOP_MOVE","axis":"x"}"#);
    }

    #[test]
    fn when_full_snapshot_arrives_then_every_field_is_mapped() {
        let snapshot = decode_snapshot(
            r#"{
                "players": {
                    "b": {"x": 10, "y": 20.5, "facing": 180, "state": "running", "lives": 2, "isAlive": true},
                    "a": {"x": 1, "y": 2, "facing": 0, "state": "moonwalk", "lives": 0, "isAlive": false}
                },
                "platforms": [{"x": 0, "y": 580, "w": 800, "h": 20}],
                "gameStarted": true,
                "timeRemaining": 299
            }"#,
        )
        .expect("valid snapshot");

        let ids: Vec<&str> = snapshot.players.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let b = snapshot.player("b").expect("player b");
        assert_eq!(b.position(), Some((10.0, 20.5)));
        assert_eq!(b.state, Some(AnimState::Running));
        assert_eq!(b.lives, Some(2));
        assert!(b.is_alive);

        let a = snapshot.player("a").expect("player a");
        assert_eq!(a.state, None);
        assert!(!a.is_alive);

        assert_eq!(
            snapshot.platforms,
            vec![Rect {
                x: 0.0,
                y: 580.0,
                w: 800.0,
                h: 20.0
            }]
        );
        assert!(snapshot.game_started);
        assert_eq!(snapshot.time_remaining, Some(299));
    }

    #[test]
    fn when_fields_are_absent_then_they_have_no_value() {
        let snapshot = decode_snapshot(r#"{"players": {"p": {"x": 5}}}"#).expect("valid snapshot");

        assert!(snapshot.platforms.is_empty());
        assert!(!snapshot.game_started);
        assert_eq!(snapshot.time_remaining, None);

        let p = snapshot.player("p").expect("player p");
        assert_eq!(p.y, None);
        assert_eq!(p.facing, None);
        assert_eq!(p.lives, None);
        assert!(!p.is_alive);

        assert_eq!(decode_snapshot("{}").expect("empty object"), Snapshot::default());
    }

    #[test]
    fn when_payload_is_malformed_then_protocol_error_is_returned() {
        for text in [
            "not json",
            "[]",
            r#"{"players": []}"#,
            r#"{"platforms": [{"x": 1}]}"#,
            r#"{"players": {"p": {"lives": -1}}}"#,
            r#"{"gameStarted": "yes"}"#,
            "[null, null, true, 7]",
            r#"{"players": {"p": [1, 2]}}"#,
            r#"{"platforms": [[0, 0, 1, 1]]}"#,
        ] {
            assert!(decode_snapshot(text).is_err(), "accepted {text}");
        }
    }

    #[test]
    fn when_variant_name_is_parsed_then_case_is_ignored() {
        assert_eq!(
            ProtocolVariant::parse("Minimal"),
            Some(ProtocolVariant::Minimal)
        );
        assert_eq!(
            ProtocolVariant::parse(" extended "),
            Some(ProtocolVariant::Extended)
        );
        assert_eq!(ProtocolVariant::parse("v2"), None);
    }
}
