//! WebSocket connection and event loop.
//!
//! The connection spawns a tokio task that owns the socket and handles:
//!
//! - Incoming text messages, parsed as [`Envelope`]s and handed to the
//!   inbound channel (malformed messages are dropped)
//! - Outgoing frames from the [`Transport`] API, written as
//!   [`OutboundEnvelope`]s

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use serde_json::{from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::SourceHandle;
use crate::protocol::{Envelope, Frame, OutboundEnvelope};

use super::Transport;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write an envelope to the socket.
    Send(OutboundEnvelope),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the host.
///
/// Cloning is cheap; every clone feeds the same event loop.
#[derive(Clone, Debug)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl Connection {
    /// Creates a connection from a WebSocket stream.
    ///
    /// Spawns the event loop task and returns the receiver that yields every
    /// well-formed inbound envelope in arrival order.
    pub(crate) fn new(
        ws_stream: WebSocketStream<TcpStream>,
    ) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(ws_stream, command_rx, inbound_tx));

        (Self { command_tx }, inbound_rx)
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Closes the socket gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    fn enqueue(&self, envelope: OutboundEnvelope) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Send(envelope))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WebSocketStream<TcpStream>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        inbound_tx: mpsc::UnboundedSender<Envelope>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(envelope) = Self::parse_incoming(&text)
                                && inbound_tx.send(envelope).is_err()
                            {
                                debug!("Inbound receiver dropped");
                                break;
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(envelope)) => {
                            let json = match to_string(&envelope) {
                                Ok(json) => json,
                                Err(e) => {
                                    warn!(error = %e, "Failed to serialize outbound envelope");
                                    continue;
                                }
                            };

                            if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                                warn!(error = %e, "Failed to send frame");
                                break;
                            }

                            trace!("Frame sent");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        debug!("Event loop terminated");
    }

    /// Parses an incoming text message, failing closed.
    fn parse_incoming(text: &str) -> Option<Envelope> {
        match from_str::<Envelope>(text) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                debug!(error = %e, "Dropping malformed inbound message");
                None
            }
        }
    }
}

impl Transport for Connection {
    fn post_message(&self, target: &SourceHandle, frame: Frame) -> Result<()> {
        self.enqueue(OutboundEnvelope::new(Some(target.clone()), &frame))
    }

    fn send_to_host(&self, frame: Frame) -> Result<()> {
        self.enqueue(OutboundEnvelope::new(None, &frame))
    }
}

// ============================================================================
// Tests
// ============================================================================
