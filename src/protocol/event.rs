//! Typed inbound events.
//!
//! Frames are routed by name, but consumers that care about the payload
//! parse them into [`ParsedEvent`] instead of poking at raw JSON.
//!
//! # Event Types
//!
//! | Group | Events |
//! |-------|--------|
//! | Hydration | `settings-updated`, `site-settings-updated`, `bookmarks-updated`, `password-details-updated`, `password-site-details-updated`, `disabled-sites-updated`, `language`, `bravery-defaults-updated`, `downloads-updated` |
//! | Zoom | `zoom-in`, `zoom-out`, `zoom-reset` |
//! | Wallet | `wallet-balance-updated` |
//! | Query | `query-response` |
//! | About page | `state-updated`, `decrypted-password`, `flash-updated` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::identifiers::RequestId;

use super::frame::Frame;
use super::names;

// ============================================================================
// SnapshotKind
// ============================================================================

/// The independent hydration snapshots a page can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// Application settings.
    Settings,
    /// Per-site settings.
    SiteSettings,
    /// Bookmarks and folders.
    Bookmarks,
    /// Saved passwords.
    PasswordDetails,
    /// Password-manager disabled sites.
    PasswordSiteDetails,
    /// Shield-disabled sites.
    DisabledSites,
    /// UI language.
    Language,
    /// Default shield settings.
    BraveryDefaults,
    /// Downloads.
    Downloads,
}

impl SnapshotKind {
    /// Every snapshot kind.
    pub const ALL: [SnapshotKind; 9] = [
        Self::Settings,
        Self::SiteSettings,
        Self::Bookmarks,
        Self::PasswordDetails,
        Self::PasswordSiteDetails,
        Self::DisabledSites,
        Self::Language,
        Self::BraveryDefaults,
        Self::Downloads,
    ];

    /// Returns the event name the host publishes this snapshot under.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Settings => names::SETTINGS_UPDATED,
            Self::SiteSettings => names::SITE_SETTINGS_UPDATED,
            Self::Bookmarks => names::BOOKMARKS_UPDATED,
            Self::PasswordDetails => names::PASSWORD_DETAILS_UPDATED,
            Self::PasswordSiteDetails => names::PASSWORD_SITE_DETAILS_UPDATED,
            Self::DisabledSites => names::DISABLED_SITES_UPDATED,
            Self::Language => names::LANGUAGE,
            Self::BraveryDefaults => names::BRAVERY_DEFAULTS_UPDATED,
            Self::Downloads => names::DOWNLOADS_UPDATED,
        }
    }

    /// Looks up the kind published under `event`.
    #[must_use]
    pub fn from_event_name(event: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.event_name() == event)
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed inbound event for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// Settings snapshot.
    SettingsUpdated(Value),

    /// Site settings snapshot.
    SiteSettingsUpdated(Value),

    /// Bookmarks snapshot.
    BookmarksUpdated {
        /// Bookmark entries.
        bookmarks: Value,
        /// Bookmark folders.
        bookmark_folders: Value,
    },

    /// Password details snapshot.
    PasswordDetailsUpdated(Value),

    /// Password-manager disabled sites.
    PasswordSiteDetailsUpdated(Value),

    /// Shield-disabled sites.
    DisabledSitesUpdated(Value),

    /// UI language.
    LanguageUpdated {
        /// Active language code.
        lang_code: String,
        /// Available language codes.
        language_codes: Vec<String>,
    },

    /// Default shield settings.
    BraveryDefaultsUpdated(Value),

    /// Downloads snapshot.
    DownloadsUpdated(Value),

    /// Zoom one step in.
    ZoomIn,

    /// Zoom one step out.
    ZoomOut,

    /// Reset zoom.
    ZoomReset,

    /// Wallet balance arrived.
    WalletBalanceUpdated {
        /// Balance as display text.
        balance: String,
        /// Currency code, when supplied.
        currency: Option<String>,
    },

    /// Application state pushed to an about page.
    StateUpdated(Value),

    /// A password decrypted on request.
    DecryptedPassword {
        /// Plaintext password.
        decrypted: String,
        /// Id the page passed with the request.
        id: Value,
    },

    /// Flash availability.
    FlashUpdated(Value),

    /// Reply to a synchronous query.
    QueryResponse {
        /// Correlation id of the request.
        request_id: RequestId,
        /// Reply value.
        value: Value,
    },

    /// Known event whose payload has the wrong shape.
    Malformed {
        /// Event name.
        event: String,
        /// What was wrong.
        reason: &'static str,
    },

    /// Unknown event kind, kept for forward compatibility.
    Unknown {
        /// Event name.
        event: String,
        /// Event arguments.
        args: Vec<Value>,
    },
}

impl ParsedEvent {
    /// Parses a frame into a typed variant.
    #[must_use]
    pub fn parse(frame: &Frame) -> Self {
        let detail = frame.detail();

        match frame.event.as_str() {
            names::SETTINGS_UPDATED => Self::SettingsUpdated(detail),
            names::SITE_SETTINGS_UPDATED => Self::SiteSettingsUpdated(detail),
            names::BOOKMARKS_UPDATED => Self::BookmarksUpdated {
                bookmarks: field(&detail, "bookmarks"),
                bookmark_folders: field(&detail, "bookmarkFolders"),
            },
            names::PASSWORD_DETAILS_UPDATED => Self::PasswordDetailsUpdated(detail),
            names::PASSWORD_SITE_DETAILS_UPDATED => Self::PasswordSiteDetailsUpdated(detail),
            names::DISABLED_SITES_UPDATED => Self::DisabledSitesUpdated(detail),
            names::LANGUAGE => Self::LanguageUpdated {
                lang_code: detail
                    .get("langCode")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                language_codes: detail
                    .get("languageCodes")
                    .and_then(Value::as_array)
                    .map(|codes| {
                        codes
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            names::BRAVERY_DEFAULTS_UPDATED => Self::BraveryDefaultsUpdated(detail),
            names::DOWNLOADS_UPDATED => Self::DownloadsUpdated(detail),
            names::ZOOM_IN => Self::ZoomIn,
            names::ZOOM_OUT => Self::ZoomOut,
            names::ZOOM_RESET => Self::ZoomReset,
            names::WALLET_BALANCE_UPDATED => parse_wallet_balance(frame, &detail),
            names::QUERY_RESPONSE => parse_query_response(frame),
            names::STATE_UPDATED => Self::StateUpdated(detail),
            names::DECRYPTED_PASSWORD => match detail.get("decrypted").and_then(Value::as_str) {
                Some(decrypted) => Self::DecryptedPassword {
                    decrypted: decrypted.to_string(),
                    id: field(&detail, "id"),
                },
                None => Self::Malformed {
                    event: frame.event.clone(),
                    reason: "missing decrypted text",
                },
            },
            names::FLASH_UPDATED => Self::FlashUpdated(detail),
            _ => Self::Unknown {
                event: frame.event.clone(),
                args: frame.args.clone(),
            },
        }
    }

    /// Returns `true` if `event` names a kind this module understands.
    #[must_use]
    pub fn is_known(event: &str) -> bool {
        SnapshotKind::from_event_name(event).is_some()
            || matches!(
                event,
                names::ZOOM_IN
                    | names::ZOOM_OUT
                    | names::ZOOM_RESET
                    | names::WALLET_BALANCE_UPDATED
                    | names::QUERY_RESPONSE
                    | names::STATE_UPDATED
                    | names::DECRYPTED_PASSWORD
                    | names::FLASH_UPDATED
            )
    }
}

// ============================================================================
// Parsing Helpers
// ============================================================================

/// Gets a field from an object, `Null` when absent.
#[inline]
fn field(detail: &Value, key: &str) -> Value {
    detail.get(key).cloned().unwrap_or(Value::Null)
}

/// Balance may arrive as a number, a string, or `{ balance, currency }`.
fn parse_wallet_balance(frame: &Frame, detail: &Value) -> ParsedEvent {
    let (raw, currency) = match detail {
        Value::Object(map) => (
            map.get("balance").cloned().unwrap_or(Value::Null),
            map.get("currency")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        other => (other.clone(), None),
    };

    let balance = match raw {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        _ => {
            return ParsedEvent::Malformed {
                event: frame.event.clone(),
                reason: "balance is neither a string nor a number",
            };
        }
    };

    ParsedEvent::WalletBalanceUpdated { balance, currency }
}

fn parse_query_response(frame: &Frame) -> ParsedEvent {
    let request_id = frame
        .arg(0)
        .and_then(Value::as_str)
        .and_then(RequestId::parse);

    match request_id {
        Some(request_id) => ParsedEvent::QueryResponse {
            request_id,
            value: frame.arg(1).cloned().unwrap_or(Value::Null),
        },
        None => ParsedEvent::Malformed {
            event: frame.event.clone(),
            reason: "missing or invalid request id",
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
