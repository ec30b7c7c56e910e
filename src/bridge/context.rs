//! Content context.
//!
//! Everything one page (or content-script instance) owns, built fresh per
//! page load: the bridge with its binding and subscription table, the
//! action forwarder, the query client and the hydration coordinator.
//! Nothing here is shared between contexts.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::forwarder::{ActionForwarder, QueryClient};
use crate::identifiers::ContextId;
use crate::protocol::Envelope;
use crate::stubs::{
    AboutPage, BalanceDisplay, BlockedScriptNotice, IdleStateStub, SpellCheckStub,
    WalletBalanceStub,
};
use crate::transport::Transport;

use super::core::{Bridge, Delivery};
use super::hydration::Hydration;
use super::options::BridgeOptions;
use super::zoom::{Renderer, ZoomReplicator};

// ============================================================================
// ContentContext
// ============================================================================

/// One isolated content context.
pub struct ContentContext {
    options: BridgeOptions,
    bridge: Bridge,
    forwarder: ActionForwarder,
    queries: QueryClient,
    hydration: Hydration,
}

impl fmt::Debug for ContentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentContext")
            .field("bridge", &self.bridge)
            .field("pending_queries", &self.queries.pending_count())
            .finish_non_exhaustive()
    }
}

impl ContentContext {
    /// Creates a context over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `options` are
    /// invalid.
    pub fn new(options: BridgeOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        let bridge = Bridge::new(&options, Arc::clone(&transport))?;
        let forwarder = ActionForwarder::new(transport);
        let queries = QueryClient::attach(&bridge, &options);
        let hydration = Hydration::new(bridge.clone());

        Ok(Self {
            options,
            bridge,
            forwarder,
            queries,
            hydration,
        })
    }

    /// Returns the context id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.bridge.context_id()
    }

    /// Returns the options the context was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Returns the bridge.
    #[inline]
    #[must_use]
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Returns the action forwarder.
    #[inline]
    #[must_use]
    pub fn forwarder(&self) -> &ActionForwarder {
        &self.forwarder
    }

    /// Returns the query client.
    #[inline]
    #[must_use]
    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    /// Returns the hydration coordinator.
    #[inline]
    #[must_use]
    pub fn hydration(&self) -> &Hydration {
        &self.hydration
    }

    /// Feeds one inbound message to the bridge.
    pub fn receive(&self, envelope: Envelope) -> Delivery {
        self.bridge.receive(envelope)
    }

    // ========================================================================
    // Stubs
    // ========================================================================

    /// Attaches a zoom replicator driving `renderer`.
    #[must_use]
    pub fn attach_zoom(&self, renderer: Arc<dyn Renderer>) -> Arc<ZoomReplicator> {
        ZoomReplicator::attach(&self.bridge, self.options.zoom_bounds, renderer)
    }

    /// Creates an idle-state stub.
    #[must_use]
    pub fn idle_state(&self) -> IdleStateStub {
        IdleStateStub::new(self.forwarder.clone())
    }

    /// Creates the blocked-script notice for the page at `page_url`.
    #[must_use]
    pub fn blocked_scripts(&self, page_url: impl Into<String>) -> BlockedScriptNotice {
        BlockedScriptNotice::new(self.forwarder.clone(), page_url)
    }

    /// Creates a spell-check stub.
    #[must_use]
    pub fn spell_check(&self) -> SpellCheckStub {
        SpellCheckStub::new(self.queries.clone())
    }

    /// Wires the wallet balance display and requests the balance.
    pub fn attach_wallet(&self, display: Arc<dyn BalanceDisplay>) {
        WalletBalanceStub::attach(&self.bridge, &self.forwarder, display);
    }

    /// Creates the about-page command surface.
    #[must_use]
    pub fn about_page(&self) -> AboutPage {
        AboutPage::new(self.bridge.clone())
    }
}

impl Drop for ContentContext {
    fn drop(&mut self) {
        self.queries.cancel_all();
        debug!(context = %self.bridge.context_id(), "Content context torn down");
    }
}

// ============================================================================
// Tests
// ============================================================================
