//! WebSocket connector built on `tokio-tungstenite`.
//!
//! Each attempt spawns a tokio task that performs the client handshake and
//! then runs the event loop for that connection.
//!
//! # Event Loop
//!
//! The link task handles:
//!
//! - Incoming frames from the peer (text and binary forwarded, control
//!   frames ignored)
//! - Outgoing payloads from the channel
//! - Close requests from the channel, including before the handshake ends

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::link::{Connector, EventSink, Link, Payload};

// ============================================================================
// Constants
// ============================================================================

/// URL schemes accepted as WebSocket endpoints.
const SUPPORTED_SCHEMES: &[&str] = &["ws", "wss"];

// ============================================================================
// LinkCommand
// ============================================================================

/// Internal commands for the link task.
enum LinkCommand {
    /// Write a payload.
    Send(Payload),
    /// Close the connection.
    Close,
}

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Default [`Connector`] opening `ws://` / `wss://` client connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a new WebSocket connector.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<Box<dyn Link>> {
        let url = parse_endpoint(endpoint)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::config("WebSocket connector requires a Tokio runtime"))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        runtime.spawn(run_link(url, command_rx, sink));

        Ok(Box::new(WebSocketLink { command_tx }))
    }
}

/// Parses and checks a WebSocket endpoint.
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|e| Error::invalid_endpoint(endpoint, e.to_string()))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::invalid_endpoint(
            endpoint,
            format!("unsupported scheme '{}', expected ws or wss", url.scheme()),
        ));
    }

    Ok(url)
}

// ============================================================================
// WebSocketLink
// ============================================================================

/// Handle to a running link task.
struct WebSocketLink {
    command_tx: mpsc::UnboundedSender<LinkCommand>,
}

impl Link for WebSocketLink {
    fn send(&self, payload: Payload) -> Result<()> {
        self.command_tx
            .send(LinkCommand::Send(payload))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn close(&self) {
        let _ = self.command_tx.send(LinkCommand::Close);
    }
}

// ============================================================================
// Link Task
// ============================================================================

/// Connects, then pumps frames until either side closes.
async fn run_link(url: Url, mut command_rx: mpsc::UnboundedReceiver<LinkCommand>, sink: EventSink) {
    let generation = sink.generation();
    let connect = connect_async(url.as_str());
    tokio::pin!(connect);

    let ws_stream = loop {
        tokio::select! {
            result = &mut connect => {
                match result {
                    Ok((ws_stream, _response)) => break ws_stream,
                    Err(e) => {
                        debug!(%generation, error = %e, "WebSocket handshake failed");
                        sink.error(e.to_string());
                        sink.closed();
                        return;
                    }
                }
            }

            command = command_rx.recv() => {
                match command {
                    Some(LinkCommand::Send(_)) => {
                        warn!(%generation, "Dropping payload written before handshake");
                    }
                    Some(LinkCommand::Close) | None => {
                        debug!(%generation, "Link closed before handshake completed");
                        sink.closed();
                        return;
                    }
                }
            }
        }
    };

    debug!(%generation, url = %url, "WebSocket connection established");
    sink.opened();

    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // Incoming frames from the peer
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        sink.message(Payload::Text(text.as_str().to_owned()));
                    }

                    Some(Ok(Message::Binary(bytes))) => {
                        sink.message(Payload::Binary(bytes.to_vec()));
                    }

                    Some(Ok(Message::Close(_))) => {
                        debug!(%generation, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        error!(%generation, error = %e, "WebSocket error");
                        sink.error(e.to_string());
                        break;
                    }

                    None => {
                        debug!(%generation, "WebSocket stream ended");
                        break;
                    }

                    // Ignore Ping, Pong, raw frames
                    _ => {}
                }
            }

            // Commands from the channel
            command = command_rx.recv() => {
                match command {
                    Some(LinkCommand::Send(payload)) => {
                        let size = payload.len();
                        if let Err(e) = ws_write.send(into_message(payload)).await {
                            warn!(%generation, error = %e, "Failed to write payload");
                            sink.error(e.to_string());
                            break;
                        }
                        trace!(%generation, size, "Payload sent");
                    }

                    Some(LinkCommand::Close) | None => {
                        debug!(%generation, "Close requested");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    sink.closed();
    debug!(%generation, "Link task terminated");
}

/// Converts a payload into a WebSocket frame.
fn into_message(payload: Payload) -> Message {
    match payload {
        Payload::Text(text) => Message::Text(text.into()),
        Payload::Binary(bytes) => Message::Binary(bytes.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================
