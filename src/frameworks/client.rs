// Framework bootstrap for the game client runtime.

use crate::domain::SpriteSheets;
use crate::frameworks::{assets, config};
use crate::interface_adapters::console::read_input_events;
use crate::interface_adapters::net::{ChannelSettings, ChannelState, ConnectionChannel};
use crate::interface_adapters::protocol::ProtocolVariant;
use crate::interface_adapters::surface::CommandBuffer;
use crate::use_cases::{InputEvent, InputMapper, RenderEngine, Session, SessionStats, run_session};

use std::{sync::Arc, time::Duration};
use tokio::io::AsyncRead;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{info, warn};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Resolved client settings.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub server_url: String,
    pub frame_interval: Duration,
    pub player_id: Option<String>,
    pub variant: ProtocolVariant,
    pub sheets: SpriteSheets,
}

/// Connects, then renders and forwards input until `shutdown` fires.
///
/// The render loop outlives the connection: after a disconnect the last snapshot keeps being
/// drawn.
pub async fn run<R>(settings: ClientSettings, input: R, shutdown: Arc<Notify>) -> SessionStats
where
    R: AsyncRead + Unpin + Send + 'static,
{
    info!(url = %settings.server_url, "connecting");
    let channel = ConnectionChannel::connect(
        settings.server_url.clone(),
        ChannelSettings {
            outbound_capacity: config::OUTBOUND_CHANNEL_CAPACITY,
            variant: settings.variant,
        },
    );
    tokio::spawn(log_state_changes(channel.state_changes()));

    let (input_tx, input_rx) = mpsc::channel::<InputEvent>(config::INPUT_CHANNEL_CAPACITY);
    tokio::spawn(read_input_events(input, input_tx));

    let session = Session {
        engine: RenderEngine::new(settings.sheets),
        mapper: InputMapper::new(settings.player_id),
        surface: Some(CommandBuffer::default()),
        sink: channel.clone(),
        frame_interval: settings.frame_interval,
    };

    let stats = run_session(session, channel.subscribe(), input_rx, shutdown).await;
    channel.close();
    stats
}

pub async fn run_with_config() {
    init_runtime();

    let sheets = assets::load_sprite_sheets(config::sprite_manifest().as_deref());
    let settings = ClientSettings {
        server_url: config::server_url(),
        frame_interval: config::frame_interval(),
        player_id: config::player_id(),
        variant: config::protocol_variant(),
        sheets,
    };

    let shutdown = Arc::new(Notify::new());
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                ctrl_c.notify_one();
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    let stats = run(settings, tokio::io::stdin(), shutdown).await;
    info!(
        frames = stats.frames,
        intents_sent = stats.intents_sent,
        "client stopped"
    );
}

async fn log_state_changes(mut state_rx: watch::Receiver<ChannelState>) {
    loop {
        let state = *state_rx.borrow_and_update();
        match state {
            ChannelState::Connecting => {}
            ChannelState::Open => info!("channel open"),
            ChannelState::Closed => {
                warn!("channel closed; showing last known state");
                break;
            }
        }
        if state_rx.changed().await.is_err() {
            break;
        }
    }
}
