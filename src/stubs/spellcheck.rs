//! Spell-check stub.
//!
//! Each word is checked with a synchronous `is-misspelled` query. Failures
//! (host gone, timeout, non-boolean reply) surface from
//! [`SpellCheckStub::is_misspelled`] as [`Error::ServiceUnavailable`]; the
//! provider callback treats them as "not misspelled" so a dead host never
//! produces spurious error markers.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::forwarder::QueryClient;
use crate::protocol::names;

/// Service name reported in errors.
const SERVICE: &str = "spellcheck";

// ============================================================================
// SpellCheckStub
// ============================================================================

/// Forwards misspelling checks to the host dictionary.
#[derive(Clone)]
pub struct SpellCheckStub {
    client: QueryClient,
}

impl SpellCheckStub {
    /// Creates a stub over `client`.
    #[must_use]
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Asks the host whether `word` is misspelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceUnavailable`] if the host did not give a
    /// boolean answer within the query timeout.
    pub async fn is_misspelled(&self, word: &str) -> Result<bool> {
        let reply = self
            .client
            .query(names::IS_MISSPELLED, vec![Value::String(word.to_string())])
            .await
            .map_err(|e| Error::service_unavailable(SERVICE, e.to_string()))?;

        match reply {
            Value::Bool(misspelled) => Ok(misspelled),
            other => Err(Error::service_unavailable(
                SERVICE,
                format!("expected boolean reply, got {other}"),
            )),
        }
    }

    /// Spell-check provider callback. Never blocks past the query timeout.
    pub async fn provider_callback(&self, word: &str) -> bool {
        match self.is_misspelled(word).await {
            Ok(misspelled) => {
                debug!(word, misspelled, "Spell check answered");
                misspelled
            }
            Err(e) => {
                warn!(word, error = %e, "Spell check unavailable, assuming correct");
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
