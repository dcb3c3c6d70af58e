// Edge-triggered mapping from device events to intents.

use super::types::{InputEvent, Key};
use crate::domain::{Axis, Direction, Intent, IntentSink, Snapshot};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Offset from a player's top-left corner to the point attacks are aimed from.
pub const PLAYER_CENTER_OFFSET: (f32, f32) = (20.0, 20.0);

/// Converts bursty, auto-repeating device events into one intent per transition.
#[derive(Debug)]
pub struct InputMapper {
    held: HashSet<Key>,
    // Last pointer angle in degrees; kept when the local player cannot be resolved.
    pointer_angle: Option<f32>,
    // Server-assigned identity, if one is known. `None` falls back to the first player entry.
    local_player_id: Option<String>,
    center_offset: (f32, f32),
}

impl InputMapper {
    pub fn new(local_player_id: Option<String>) -> Self {
        if local_player_id.is_none() {
            debug!("no player id configured; treating first snapshot entry as local player");
        }
        Self {
            held: HashSet::new(),
            pointer_angle: None,
            local_player_id,
            center_offset: PLAYER_CENTER_OFFSET,
        }
    }

    pub fn pointer_angle(&self) -> Option<f32> {
        self.pointer_angle
    }

    /// Maps one event against the latest snapshot.
    pub fn map(&mut self, event: InputEvent, snapshot: &Snapshot) -> Option<Intent> {
        match event {
            InputEvent::KeyDown(key) => {
                // Auto-repeat: the key is already down, nothing changed.
                if !self.held.insert(key) {
                    return None;
                }
                match key {
                    Key::ArrowLeft => Some(Intent::Move(Direction::Left)),
                    Key::ArrowRight => Some(Intent::Move(Direction::Right)),
                    Key::ArrowUp => Some(Intent::Move(Direction::Jump)),
                    Key::Space => Some(Intent::Attack(self.attack_angle(snapshot))),
                    Key::Enter => Some(Intent::StartGame),
                }
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(&key);
                key.is_horizontal().then_some(Intent::StopMove(Axis::X))
            }
            InputEvent::PointerMove { x, y } => {
                self.track_pointer(x, y, snapshot);
                None
            }
            InputEvent::FocusLost => {
                let was_moving = self.held.iter().any(|key| key.is_horizontal());
                self.held.clear();
                was_moving.then_some(Intent::StopMove(Axis::X))
            }
            InputEvent::StartPressed => Some(Intent::StartGame),
        }
    }

    /// Maps an event and forwards the resulting intent, if any, straight to the sink.
    pub fn dispatch<K: IntentSink + ?Sized>(
        &mut self,
        event: InputEvent,
        snapshot: &Snapshot,
        sink: &K,
    ) -> Option<Intent> {
        let intent = self.map(event, snapshot)?;
        trace!(?intent, "intent mapped");
        sink.send(intent);
        Some(intent)
    }

    fn attack_angle(&self, snapshot: &Snapshot) -> Option<f32> {
        snapshot
            .local_player(self.local_player_id.as_deref())
            .and_then(|_| self.pointer_angle)
    }

    fn track_pointer(&mut self, x: f32, y: f32, snapshot: &Snapshot) {
        let Some((_, player)) = snapshot.local_player(self.local_player_id.as_deref()) else {
            return;
        };
        let Some((px, py)) = player.position() else {
            return;
        };

        let dx = x - (px + self.center_offset.0);
        let dy = y - (py + self.center_offset.1);
        self.pointer_angle = Some(dy.atan2(dx).to_degrees());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerView;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<Intent>>,
    }

    impl IntentSink for RecordingSink {
        fn send(&self, intent: Intent) {
            self.sent.borrow_mut().push(intent);
        }
    }

    fn snapshot_with_player_at(x: f32, y: f32) -> Snapshot {
        Snapshot {
            players: vec![(
                "p1".to_string(),
                PlayerView {
                    x: Some(x),
                    y: Some(y),
                    is_alive: true,
                    ..PlayerView::default()
                },
            )],
            ..Snapshot::default()
        }
    }

    #[test]
    fn when_arrow_left_is_held_then_one_move_and_one_stop_are_sent() {
        let mut mapper = InputMapper::new(None);
        let sink = RecordingSink::default();
        let snapshot = Snapshot::default();

        for _ in 0..30 {
            mapper.dispatch(InputEvent::KeyDown(Key::ArrowLeft), &snapshot, &sink);
        }
        mapper.dispatch(InputEvent::KeyUp(Key::ArrowLeft), &snapshot, &sink);

        assert_eq!(
            *sink.sent.borrow(),
            vec![
                Intent::Move(Direction::Left),
                Intent::StopMove(Axis::X)
            ]
        );
    }

    #[test]
    fn when_either_arrow_is_released_then_a_single_stop_is_sent() {
        let mut mapper = InputMapper::new(None);
        let snapshot = Snapshot::default();

        mapper.map(InputEvent::KeyDown(Key::ArrowRight), &snapshot);
        assert_eq!(
            mapper.map(InputEvent::KeyUp(Key::ArrowRight), &snapshot),
            Some(Intent::StopMove(Axis::X))
        );
        assert_eq!(mapper.map(InputEvent::KeyUp(Key::ArrowUp), &snapshot), None);
    }

    #[test]
    fn when_jump_is_released_and_pressed_again_then_jump_is_sent_twice() {
        let mut mapper = InputMapper::new(None);
        let snapshot = Snapshot::default();
        let jump = Some(Intent::Move(Direction::Jump));

        assert_eq!(mapper.map(InputEvent::KeyDown(Key::ArrowUp), &snapshot), jump);
        assert_eq!(mapper.map(InputEvent::KeyDown(Key::ArrowUp), &snapshot), None);
        assert_eq!(mapper.map(InputEvent::KeyUp(Key::ArrowUp), &snapshot), None);
        assert_eq!(mapper.map(InputEvent::KeyDown(Key::ArrowUp), &snapshot), jump);
    }

    #[test]
    fn when_pointer_is_right_of_player_center_then_attack_angle_is_zero() {
        let mut mapper = InputMapper::new(None);
        let snapshot = snapshot_with_player_at(100.0, 100.0);

        mapper.map(InputEvent::PointerMove { x: 220.0, y: 120.0 }, &snapshot);
        let intent = mapper.map(InputEvent::KeyDown(Key::Space), &snapshot);

        assert_eq!(intent, Some(Intent::Attack(Some(0.0))));
    }

    #[test]
    fn when_pointer_is_below_player_center_then_attack_angle_is_ninety() {
        let mut mapper = InputMapper::new(None);
        let snapshot = snapshot_with_player_at(0.0, 0.0);

        mapper.map(InputEvent::PointerMove { x: 20.0, y: 70.0 }, &snapshot);
        let angle = mapper.pointer_angle().expect("angle tracked");

        assert!((angle - 90.0).abs() < 1e-4, "angle {angle}");
    }

    #[test]
    fn when_no_local_player_exists_then_attack_has_no_angle() {
        let mut mapper = InputMapper::new(None);
        let populated = snapshot_with_player_at(0.0, 0.0);
        mapper.map(InputEvent::PointerMove { x: 0.0, y: 50.0 }, &populated);

        let intent = mapper.map(InputEvent::KeyDown(Key::Space), &Snapshot::default());

        assert_eq!(intent, Some(Intent::Attack(None)));
    }

    #[test]
    fn when_explicit_id_is_configured_then_angle_is_measured_from_that_player() {
        let mut mapper = InputMapper::new(Some("p2".to_string()));
        let mut snapshot = snapshot_with_player_at(0.0, 0.0);
        snapshot.players.push((
            "p2".to_string(),
            PlayerView {
                x: Some(200.0),
                y: Some(0.0),
                is_alive: true,
                ..PlayerView::default()
            },
        ));

        // Pointer sits left of p2 and right of p1.
        mapper.map(InputEvent::PointerMove { x: 120.0, y: 20.0 }, &snapshot);
        let angle = mapper.pointer_angle().expect("angle tracked");

        assert!((angle - 180.0).abs() < 1e-4, "angle {angle}");
    }

    #[test]
    fn when_focus_is_lost_while_moving_then_a_stop_is_sent_and_keys_reset() {
        let mut mapper = InputMapper::new(None);
        let snapshot = Snapshot::default();

        mapper.map(InputEvent::KeyDown(Key::ArrowLeft), &snapshot);
        assert_eq!(
            mapper.map(InputEvent::FocusLost, &snapshot),
            Some(Intent::StopMove(Axis::X))
        );
        assert_eq!(mapper.map(InputEvent::FocusLost, &snapshot), None);
        assert_eq!(
            mapper.map(InputEvent::KeyDown(Key::ArrowLeft), &snapshot),
            Some(Intent::Move(Direction::Left))
        );
    }

    #[test]
    fn when_start_is_pressed_then_start_game_is_sent() {
        let mut mapper = InputMapper::new(None);
        let snapshot = Snapshot::default();

        assert_eq!(
            mapper.map(InputEvent::StartPressed, &snapshot),
            Some(Intent::StartGame)
        );
        assert_eq!(
            mapper.map(InputEvent::KeyDown(Key::Enter), &snapshot),
            Some(Intent::StartGame)
        );
    }
}
