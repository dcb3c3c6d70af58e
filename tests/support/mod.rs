// In-process WebSocket server standing in for the game server in integration tests.
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use arena_client::interface_adapters::net::ChannelState;

// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

pub struct TestServer {
    // `ws://` URL clients should connect to.
    pub url: String,
    // Frames pushed here are written to the first accepted client.
    pub to_client: mpsc::UnboundedSender<Message>,
    // Text frames received from the client, in order.
    pub from_client: mpsc::UnboundedReceiver<String>,
}

impl TestServer {
    pub fn send_text(&self, text: &str) {
        self.to_client
            .send(Message::Text(text.into()))
            .expect("server task alive");
    }

    pub fn close(&self) {
        self.to_client
            .send(Message::Close(None))
            .expect("server task alive");
    }

    // Next text frame from the client, failing the test after `WAIT`.
    pub async fn next_text(&mut self) -> String {
        tokio::time::timeout(WAIT, self.from_client.recv())
            .await
            .expect("client message should arrive in time")
            .expect("server task should still be running")
    }

    // Asserts the client sends nothing else for a short while.
    pub async fn assert_quiet(&mut self) {
        let extra = tokio::time::timeout(Duration::from_millis(200), self.from_client.recv()).await;
        if let Ok(Some(text)) = extra {
            panic!("unexpected client message: {text}");
        }
    }
}

// Bind an ephemeral port and serve exactly one client connection.
pub async fn start_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");

    let (to_client, mut outbound) = mpsc::unbounded_channel::<Message>();
    let (inbound_tx, from_client) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept client");
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");
        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                msg = outbound.recv() => {
                    let Some(msg) = msg else { break };
                    let closing = matches!(msg, Message::Close(_));
                    if write.send(msg).await.is_err() || closing {
                        break;
                    }
                }
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let _ = inbound_tx.send(text.as_str().to_owned());
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    });

    TestServer {
        url: format!("ws://{addr}"),
        to_client,
        from_client,
    }
}

// Address nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    drop(listener);
    format!("ws://{addr}")
}

pub async fn wait_for_state(mut state_rx: watch::Receiver<ChannelState>, expected: ChannelState) {
    tokio::time::timeout(WAIT, state_rx.wait_for(|state| *state == expected))
        .await
        .expect("state change should happen in time")
        .expect("channel state sender alive");
}
