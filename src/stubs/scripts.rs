//! Blocked-script notice.
//!
//! When script execution is suppressed on a page, every `<script>` element
//! that failed to load is reported once per page load as a
//! `window-set-blocked-by` action with `blockType: "noScript"`. The reported
//! location is the element's source resolved against the page URL; inline
//! scripts and unparseable sources fall back to the page URL itself.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::forwarder::ActionForwarder;
use crate::protocol::ActionType;

/// `blockType` value for script suppression.
const NO_SCRIPT: &str = "noScript";

// ============================================================================
// ScriptTag
// ============================================================================

/// A script element whose load was suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptTag {
    /// The `src` attribute, if any.
    pub src: Option<String>,
}

impl ScriptTag {
    /// An external script.
    #[must_use]
    pub fn external(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
        }
    }

    /// An inline script.
    #[must_use]
    pub fn inline() -> Self {
        Self { src: None }
    }
}

// ============================================================================
// BlockedScriptNotice
// ============================================================================

/// Reports suppressed scripts for one page load.
pub struct BlockedScriptNotice {
    forwarder: ActionForwarder,
    page_url: String,
    reported: AtomicBool,
}

impl BlockedScriptNotice {
    /// Creates a notice for the page at `page_url`.
    #[must_use]
    pub fn new(forwarder: ActionForwarder, page_url: impl Into<String>) -> Self {
        Self {
            forwarder,
            page_url: page_url.into(),
            reported: AtomicBool::new(false),
        }
    }

    /// Returns the location reported for `tag`.
    #[must_use]
    pub fn location_of(&self, tag: &ScriptTag) -> String {
        let Some(src) = tag.src.as_deref().filter(|src| !src.is_empty()) else {
            return self.page_url.clone();
        };

        match Url::parse(&self.page_url).and_then(|base| base.join(src)) {
            Ok(resolved) => resolved.into(),
            Err(e) => {
                trace!(src, error = %e, "Script source not resolvable");
                self.page_url.clone()
            }
        }
    }

    /// Forwards one action per tag. Only the first call per page load sends
    /// anything.
    ///
    /// Returns the number of actions forwarded.
    pub fn report(&self, tags: &[ScriptTag]) -> usize {
        if self.reported.swap(true, Ordering::AcqRel) {
            trace!("Blocked scripts already reported for this load");
            return 0;
        }

        for tag in tags {
            let mut fields = Map::new();
            fields.insert("blockType".to_string(), Value::String(NO_SCRIPT.to_string()));
            fields.insert("location".to_string(), Value::String(self.location_of(tag)));
            self.forwarder.dispatch(ActionType::SetBlockedBy, fields);
        }

        debug!(count = tags.len(), page = %self.page_url, "Blocked scripts reported");
        tags.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use serde_json::json;

    use crate::protocol::decode_batch;
    use crate::transport::{ChannelTransport, HostEnd};

    fn notice(page: &str) -> (BlockedScriptNotice, HostEnd) {
        let (transport, host) = ChannelTransport::pair();
        (
            BlockedScriptNotice::new(ActionForwarder::new(Arc::new(transport)), page),
            host,
        )
    }

    #[test]
    fn test_location_resolution() {
        let (notice, _host) = notice("https://example.com/dir/page.html");

        assert_eq!(
            notice.location_of(&ScriptTag::external("app.js")),
            "https://example.com/dir/app.js"
        );
        assert_eq!(
            notice.location_of(&ScriptTag::external("https://cdn.example/lib.js")),
            "https://cdn.example/lib.js"
        );
        assert_eq!(
            notice.location_of(&ScriptTag::inline()),
            "https://example.com/dir/page.html"
        );
        assert_eq!(
            notice.location_of(&ScriptTag::external("")),
            "https://example.com/dir/page.html"
        );
    }

    #[test]
    fn test_unparseable_page_falls_back() {
        let (notice, _host) = notice("not a url");
        assert_eq!(notice.location_of(&ScriptTag::external("a.js")), "not a url");
    }

    #[test]
    fn test_reported_once_per_load() {
        let (notice, mut host) = notice("https://example.com/");
        let tags = [ScriptTag::external("/a.js"), ScriptTag::inline()];

        assert_eq!(notice.report(&tags), 2);
        assert_eq!(notice.report(&tags), 0);

        let sent = host.drain();
        assert_eq!(sent.len(), 2);

        let text = sent[0].frame().arg(0).and_then(Value::as_str).expect("text");
        let records = decode_batch(text).expect("batch");
        assert_eq!(records[0].action_type, ActionType::SetBlockedBy);
        assert_eq!(records[0].get("blockType"), Some(&json!("noScript")));
        assert_eq!(
            records[0].get("location"),
            Some(&json!("https://example.com/a.js"))
        );
    }
}
