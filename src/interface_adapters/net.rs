use crate::domain::{Intent, IntentSink, Snapshot};
use crate::interface_adapters::protocol::{ProtocolVariant, decode_snapshot, encode_intent};

use futures_util::{SinkExt, StreamExt};
use std::{
    fmt,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tokio::net::TcpStream;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};
use tracing::{Instrument, debug, info, info_span, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug)]
pub enum TransportError {
    // Categorizes link failures; every one of them closes the channel.
    Connect(WsError),
    Send(WsError),
    Receive(WsError),
    Serialization(serde_json::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(e) => write!(f, "connect failed: {e}"),
            TransportError::Send(e) => write!(f, "send failed: {e}"),
            TransportError::Receive(e) => write!(f, "receive failed: {e}"),
            TransportError::Serialization(e) => write!(f, "intent serialization failed: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Settings applied to a single connection attempt.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Capacity of the outbound intent queue.
    pub outbound_capacity: usize,
    /// Wire variant for outbound intents.
    pub variant: ProtocolVariant,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
// Snapshots buffered per `on_snapshot` handler before it starts lagging.
const SNAPSHOT_EVENT_CAPACITY: usize = 64;

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Where applied snapshots go: the latest-value cell for rendering and a broadcast that hands
// every snapshot to `on_snapshot` handlers.
#[derive(Clone)]
struct SnapshotFeed {
    latest: Arc<watch::Sender<Arc<Snapshot>>>,
    events: broadcast::Sender<Arc<Snapshot>>,
}

impl SnapshotFeed {
    fn new() -> Self {
        let (latest, _latest_rx) = watch::channel(Arc::new(Snapshot::default()));
        let (events, _events_rx) = broadcast::channel(SNAPSHOT_EVENT_CAPACITY);
        Self {
            latest: Arc::new(latest),
            events,
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        // Last write wins; the previous snapshot is dropped, never merged.
        self.latest.send_replace(snapshot.clone());
        // Err only means no handler is registered.
        let _ = self.events.send(snapshot);
    }
}

/// Client end of the game server link.
///
/// Inbound snapshots replace a single latest-value cell and are also handed to every
/// `on_snapshot` handler; outbound intents go through a bounded queue drained by the connection
/// task. Cloning shares the same connection.
#[derive(Clone)]
pub struct ConnectionChannel {
    state_tx: Arc<watch::Sender<ChannelState>>,
    feed: SnapshotFeed,
    outbound_tx: mpsc::Sender<Intent>,
    shutdown: Arc<Notify>,
    last_drop_log: Arc<Mutex<Instant>>,
}

impl ConnectionChannel {
    /// Starts connecting to `url` in the background. Must be called inside a Tokio runtime.
    ///
    /// There is no reconnect: once the channel is `Closed` a new `connect` is required.
    pub fn connect(url: impl Into<String>, settings: ChannelSettings) -> Self {
        let url = url.into();
        let (state_tx, _state_rx) = watch::channel(ChannelState::Connecting);
        let (outbound_tx, outbound_rx) = mpsc::channel(settings.outbound_capacity.max(1));

        let channel = Self {
            state_tx: Arc::new(state_tx),
            feed: SnapshotFeed::new(),
            outbound_tx,
            shutdown: Arc::new(Notify::new()),
            last_drop_log: Arc::new(Mutex::new(Instant::now() - LOG_THROTTLE)),
        };

        let span = info_span!("conn", %url);
        tokio::spawn(
            connection_task(
                url,
                settings.variant,
                channel.state_tx.clone(),
                channel.feed.clone(),
                outbound_rx,
                channel.shutdown.clone(),
            )
            .instrument(span),
        );

        channel
    }

    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    /// Latest-snapshot cell. Starts out holding an empty snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.feed.latest.subscribe()
    }

    /// Calls `handler` once for every snapshot applied after registration, in arrival order.
    ///
    /// A handler that falls more than `SNAPSHOT_EVENT_CAPACITY` snapshots behind skips the
    /// oldest ones and logs a warning.
    pub fn on_snapshot<F>(&self, handler: F) -> JoinHandle<()>
    where
        F: FnMut(Arc<Snapshot>) + Send + 'static,
    {
        spawn_snapshot_handler(self.feed.events.subscribe(), handler)
    }

    /// Queues an intent for the server. A no-op unless the channel is `Open`.
    pub fn send(&self, intent: Intent) {
        if self.state() != ChannelState::Open {
            debug!(?intent, "channel not open; dropping intent");
            return;
        }

        match self.outbound_tx.try_send(intent) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(intent)) => {
                let log = self
                    .last_drop_log
                    .lock()
                    .is_ok_and(|mut last| should_log(&mut last));
                if log {
                    warn!(?intent, "outbound queue full; dropping intent");
                }
            }
            Err(mpsc::error::TrySendError::Closed(intent)) => {
                debug!(?intent, "connection task gone; dropping intent");
            }
        }
    }

    /// Asks the connection task to send a close frame and stop.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}

impl IntentSink for ConnectionChannel {
    fn send(&self, intent: Intent) {
        ConnectionChannel::send(self, intent);
    }
}

fn spawn_snapshot_handler<F>(
    mut events: broadcast::Receiver<Arc<Snapshot>>,
    mut handler: F,
) -> JoinHandle<()>
where
    F: FnMut(Arc<Snapshot>) + Send + 'static,
{
    tokio::spawn(async move {
        let mut last_lag_log = Instant::now() - LOG_THROTTLE;
        loop {
            match events.recv().await {
                Ok(snapshot) => handler(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    if should_log(&mut last_lag_log) {
                        warn!(skipped, "snapshot handler lagging; skipped snapshots");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn advance_state(state_tx: &watch::Sender<ChannelState>, next: ChannelState) {
    state_tx.send_if_modified(|current| {
        if next > *current {
            *current = next;
            true
        } else {
            false
        }
    });
}

enum LoopControl {
    Continue,
    Disconnect,
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_payloads: u32,
}

async fn connection_task(
    url: String,
    variant: ProtocolVariant,
    state_tx: Arc<watch::Sender<ChannelState>>,
    feed: SnapshotFeed,
    mut outbound_rx: mpsc::Receiver<Intent>,
    shutdown: Arc<Notify>,
) {
    let connected = tokio::select! {
        _ = shutdown.notified() => {
            debug!("closed before connecting");
            advance_state(&state_tx, ChannelState::Closed);
            return;
        }
        result = connect_async(url.as_str()) => result.map_err(TransportError::Connect),
    };

    let stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(error = %e, "failed to connect");
            advance_state(&state_tx, ChannelState::Closed);
            return;
        }
    };

    advance_state(&state_tx, ChannelState::Open);
    info!("connected to server");

    let mut stats = ConnStats::default();
    if let Err(e) = run_link(
        stream,
        variant,
        &feed,
        &mut outbound_rx,
        &shutdown,
        &mut stats,
    )
    .await
    {
        warn!(error = %e, "connection lost");
    }

    // Stop accepting intents before reporting the close.
    outbound_rx.close();
    advance_state(&state_tx, ChannelState::Closed);

    debug!(
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_payloads = stats.invalid_payloads,
        "connection stats"
    );
    info!("disconnected from server");
}

async fn run_link(
    stream: WsStream,
    variant: ProtocolVariant,
    feed: &SnapshotFeed,
    outbound_rx: &mut mpsc::Receiver<Intent>,
    shutdown: &Notify,
    stats: &mut ConnStats,
) -> Result<(), TransportError> {
    let (mut write, mut read) = stream.split();
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!("closing connection");
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!(error = %e, "close frame not sent");
                }
                return Ok(());
            }

            // Incoming message from the server
            incoming = read.next() => {
                let control = match incoming {
                    Some(Ok(msg)) => {
                        handle_incoming(msg, feed, stats, &mut last_invalid_log)
                    }
                    Some(Err(e)) => return Err(TransportError::Receive(e)),
                    None => {
                        info!("server closed the stream");
                        LoopControl::Disconnect
                    }
                };
                if let LoopControl::Disconnect = control {
                    return Ok(());
                }
            }

            // Outgoing intent
            intent = outbound_rx.recv() => {
                let Some(intent) = intent else {
                    return Ok(());
                };
                let text = encode_intent(intent, variant).map_err(TransportError::Serialization)?;
                let bytes = text.len();
                write
                    .send(Message::Text(text.into()))
                    .await
                    .map_err(TransportError::Send)?;
                stats.msgs_out += 1;
                stats.bytes_out += bytes as u64;
            }
        }
    }
}

fn handle_incoming(
    msg: Message,
    feed: &SnapshotFeed,
    stats: &mut ConnStats,
    last_invalid_log: &mut Instant,
) -> LoopControl {
    match msg {
        Message::Text(text) => {
            stats.msgs_in += 1;
            stats.bytes_in += text.len() as u64;

            match decode_snapshot(&text) {
                Ok(snapshot) => feed.publish(snapshot),
                Err(e) => {
                    stats.invalid_payloads += 1;
                    if should_log(last_invalid_log) {
                        warn!(error = %e, bytes = text.len(), "discarding malformed snapshot");
                    }
                }
            }
            LoopControl::Continue
        }
        Message::Binary(bytes) => {
            stats.msgs_in += 1;
            stats.bytes_in += bytes.len() as u64;
            warn!(bytes = bytes.len(), "binary message ignored");
            LoopControl::Continue
        }
        Message::Close(frame) => {
            info!(?frame, "server sent close");
            LoopControl::Disconnect
        }
        // Ping/pong replies are handled by tungstenite.
        _ => LoopControl::Continue,
    }
}
