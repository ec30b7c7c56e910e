//! WebSocket server the host connects to.
//!
//! # Connection Flow
//!
//! 1. The content side binds to `localhost:0` (random port)
//! 2. The host is told the `ws://` URL out of band
//! 3. The host connects; the socket is upgraded to WebSocket
//! 4. A [`ContentContext`] is built over the connection and a pump task
//!    feeds every inbound envelope to its bridge, in arrival order

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::bridge::{BridgeOptions, ContentContext};
use crate::error::{Error, Result};

use super::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for waiting for the host to connect.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// PendingServer
// ============================================================================

/// A WebSocket server that is bound but not yet connected.
///
/// # Example
///
/// ```no_run
/// use std::net::{IpAddr, Ipv4Addr};
/// use embedder_bridge::BridgeOptions;
/// use embedder_bridge::transport::PendingServer;
///
/// # async fn example() -> embedder_bridge::Result<()> {
/// let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// println!("host should connect to {}", server.ws_url());
///
/// let (_connection, context) = server.accept(BridgeOptions::new()).await?;
/// context.hydration().request(&[embedder_bridge::SnapshotKind::Settings])?;
/// # Ok(())
/// # }
/// ```
pub struct PendingServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
}

impl PendingServer {
    /// Binds to `ip:port`. Use port 0 to let the OS pick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "WebSocket server bound");

        Ok(Self {
            listener,
            port: actual_port,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this server.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)
    }

    /// Accepts the host's connection and builds a content context over it.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `options` are invalid
    /// - [`Error::ConnectionTimeout`] if the host doesn't connect within 30s
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    pub async fn accept(self, options: BridgeOptions) -> Result<(Connection, ContentContext)> {
        options.validate()?;

        let timeout_ms = u64::try_from(CONNECTION_TIMEOUT.as_millis()).unwrap_or(u64::MAX);
        let (stream, addr) = timeout(CONNECTION_TIMEOUT, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(timeout_ms))??;

        debug!(?addr, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        info!(port = self.port, "WebSocket connection established");

        let (connection, mut inbound) = Connection::new(ws_stream);
        let context = ContentContext::new(options, Arc::new(connection.clone()))?;

        let bridge = context.bridge().clone();
        tokio::spawn(async move {
            while let Some(envelope) = inbound.recv().await {
                let delivery = bridge.receive(envelope);
                trace!(?delivery, "Inbound envelope processed");
            }
            debug!(context = %bridge.context_id(), "Inbound pump stopped");
        });

        Ok((connection, context))
    }
}

// ============================================================================
// Tests
// ============================================================================
