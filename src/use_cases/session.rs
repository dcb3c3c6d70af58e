// Single-threaded client loop: display ticks, device input and shutdown.

use super::input::InputMapper;
use super::render::RenderEngine;
use super::types::InputEvent;
use crate::domain::{IntentSink, Snapshot, Surface};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub input_events: u64,
    pub intents_sent: u64,
}

/// Everything the loop owns for its lifetime.
pub struct Session<S, K> {
    pub engine: RenderEngine,
    pub mapper: InputMapper,
    pub surface: Option<S>,
    pub sink: K,
    pub frame_interval: Duration,
}

const FRAME_LOG_EVERY: u64 = 600;

/// Drives rendering on the frame interval and forwards input edges as intents.
///
/// The snapshot cell is read once per tick and once per input event. Snapshot arrival never
/// triggers a draw by itself. The loop keeps rendering after the input source or the
/// connection closes and only exits on `shutdown`.
pub async fn run_session<S, K>(
    mut session: Session<S, K>,
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    mut input_rx: mpsc::Receiver<InputEvent>,
    shutdown: Arc<Notify>,
) -> SessionStats
where
    S: Surface,
    K: IntentSink,
{
    let mut stats = SessionStats::default();
    let mut input_open = true;

    let mut interval = tokio::time::interval(session.frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {
                // One consistent view for the whole draw pass.
                let snapshot = snapshot_rx.borrow().clone();
                session.engine.render(session.surface.as_mut(), &snapshot);
                stats.frames += 1;
                trace!(cursor = session.engine.cursor().value(), "frame rendered");
                if stats.frames % FRAME_LOG_EVERY == 0 {
                    debug!(frames = stats.frames, "render loop alive");
                }
            }
            event = input_rx.recv(), if input_open => {
                match event {
                    Some(event) => {
                        stats.input_events += 1;
                        let snapshot = snapshot_rx.borrow().clone();
                        if session.mapper.dispatch(event, &snapshot, &session.sink).is_some() {
                            stats.intents_sent += 1;
                        }
                    }
                    None => {
                        info!("input source closed; rendering continues");
                        input_open = false;
                    }
                }
            }
        }
    }

    debug!(
        frames = stats.frames,
        input_events = stats.input_events,
        intents_sent = stats.intents_sent,
        "session stats"
    );
    stats
}
