use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use shared::protocol::{ChannelEvent, ControlMessage};
use tokio::{
    net::TcpStream,
    sync::{broadcast, Mutex},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

/// The operations the core needs from the live-update transport.
/// Reconnect and retry policy for the socket itself stays on the transport
/// side; the core only reacts to reconnect signals via its resync path.
#[async_trait]
pub trait SlideChannelTransport: Send + Sync {
    /// Opens the underlying connection if it is not already open.
    async fn ensure_open(&self) -> Result<()>;

    /// Sends one control frame. Callers do not await an acknowledgment.
    async fn send(&self, frame: ControlMessage) -> Result<()>;

    fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent>;

    async fn close(&self);
}

pub struct MissingTransport;

#[async_trait]
impl SlideChannelTransport for MissingTransport {
    async fn ensure_open(&self) -> Result<()> {
        Err(anyhow!("live channel transport is unavailable"))
    }

    async fn send(&self, _frame: ControlMessage) -> Result<()> {
        Err(anyhow!("live channel transport is unavailable"))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        broadcast::channel(1).1
    }

    async fn close(&self) {}
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

struct SocketShared {
    writer: Mutex<Option<WsSink>>,
    events: broadcast::Sender<ChannelEvent>,
}

/// Websocket-backed live channel. The connection is opened lazily on
/// first use and shared across subscription changes; inbound frames are
/// decoded and fanned out on a broadcast channel.
pub struct SocketTransport {
    ws_url: String,
    shared: Arc<SocketShared>,
}

impl SocketTransport {
    /// `server_url` is the http(s) base of the presentation service; the
    /// websocket endpoint is derived from it.
    pub fn new(server_url: &str) -> Result<Self> {
        let ws_url = if let Some(rest) = server_url.strip_prefix("https://") {
            format!("wss://{rest}/live")
        } else if let Some(rest) = server_url.strip_prefix("http://") {
            format!("ws://{rest}/live")
        } else {
            return Err(anyhow!("server_url must start with http:// or https://"));
        };
        Url::parse(&ws_url).with_context(|| format!("invalid live channel url: {ws_url}"))?;
        let (events, _) = broadcast::channel(256);
        Ok(Self {
            ws_url,
            shared: Arc::new(SocketShared {
                writer: Mutex::new(None),
                events,
            }),
        })
    }

    fn spawn_reader(&self, mut reader: WsSource) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ChannelEvent>(&text) {
                            Ok(event) => {
                                let _ = shared.events.send(event);
                            }
                            Err(err) => warn!("invalid live channel event: {err}"),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!("live channel receive failed: {err}");
                        break;
                    }
                }
            }
            // The connection is gone; drop the writer so the next
            // subscribe reopens it.
            shared.writer.lock().await.take();
            debug!("live channel closed");
        });
    }
}

#[async_trait]
impl SlideChannelTransport for SocketTransport {
    async fn ensure_open(&self) -> Result<()> {
        let mut writer = self.shared.writer.lock().await;
        if writer.is_some() {
            return Ok(());
        }
        let (stream, _) = connect_async(&self.ws_url)
            .await
            .with_context(|| format!("failed to connect live channel: {}", self.ws_url))?;
        let (sink, source) = stream.split();
        *writer = Some(sink);
        drop(writer);
        self.spawn_reader(source);
        Ok(())
    }

    async fn send(&self, frame: ControlMessage) -> Result<()> {
        let text = serde_json::to_string(&frame)?;
        let mut writer = self.shared.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(anyhow!("live channel is not open"));
        };
        if let Err(err) = sink.send(Message::Text(text)).await {
            writer.take();
            return Err(anyhow!("live channel send failed: {err}"));
        }
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.shared.events.subscribe()
    }

    async fn close(&self) {
        if let Some(mut sink) = self.shared.writer.lock().await.take() {
            let _ = sink.close().await;
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
