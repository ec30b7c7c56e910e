//! Reserved event names.
//!
//! Inbound names are emitted by the host; outbound names are sent by content
//! contexts. Any stable string works on the wire, these are the ones the
//! bundled stubs and host helpers agree on.

// ============================================================================
// Inbound (host -> context)
// ============================================================================

/// Application settings snapshot.
pub const SETTINGS_UPDATED: &str = "settings-updated";

/// Per-site settings snapshot.
pub const SITE_SETTINGS_UPDATED: &str = "site-settings-updated";

/// Bookmarks and bookmark folders snapshot.
pub const BOOKMARKS_UPDATED: &str = "bookmarks-updated";

/// Saved password details snapshot.
pub const PASSWORD_DETAILS_UPDATED: &str = "password-details-updated";

/// Sites where the password manager is disabled.
pub const PASSWORD_SITE_DETAILS_UPDATED: &str = "password-site-details-updated";

/// Sites where shields are disabled.
pub const DISABLED_SITES_UPDATED: &str = "disabled-sites-updated";

/// Current UI language and available languages.
pub const LANGUAGE: &str = "language";

/// Default shield settings.
pub const BRAVERY_DEFAULTS_UPDATED: &str = "bravery-defaults-updated";

/// Download list snapshot.
pub const DOWNLOADS_UPDATED: &str = "downloads-updated";

/// Increase zoom by one step.
pub const ZOOM_IN: &str = "zoom-in";

/// Decrease zoom by one step.
pub const ZOOM_OUT: &str = "zoom-out";

/// Reset zoom to the default scale.
pub const ZOOM_RESET: &str = "zoom-reset";

/// Wallet balance payload.
pub const WALLET_BALANCE_UPDATED: &str = "wallet-balance-updated";

/// Reply to a synchronous query: `[requestId, value]`.
pub const QUERY_RESPONSE: &str = "query-response";

/// Whole application state pushed to an about page.
pub const STATE_UPDATED: &str = "state-updated";

/// Answer to [`DECRYPT_PASSWORD`]: `{ decrypted, id }`.
pub const DECRYPTED_PASSWORD: &str = "decrypted-password";

/// Flash availability, answer to [`CHECK_FLASH_INSTALLED`].
pub const FLASH_UPDATED: &str = "flash-updated";

// ============================================================================
// Outbound (context -> host)
// ============================================================================

/// Serialized batch of action records for the host dispatcher.
pub const DISPATCH_ACTION: &str = "dispatch-action";

/// Page is listening for the listed hydration events.
pub const HYDRATION_READY: &str = "hydration-ready";

/// Spell-check query: `[requestId, word]`.
pub const IS_MISSPELLED: &str = "is-misspelled";

/// Change an application setting: `[key, value]`.
pub const CHANGE_SETTING: &str = "change-setting";

/// Change a site setting: `[hostPattern, key, value]`.
pub const CHANGE_SITE_SETTING: &str = "change-site-setting";

/// Ask the host to emit [`LANGUAGE`].
pub const REQUEST_LANGUAGE: &str = "request-language";

/// User accepted a certificate error: `[url]`.
pub const CERT_ERROR_ACCEPTED: &str = "cert-error-accepted";

/// Copy text to the clipboard: `[text]`.
pub const SET_CLIPBOARD: &str = "set-clipboard";

/// Move a bookmark or folder:
/// `[sourceDetail, destinationDetail, prepend, destinationIsParent]`.
pub const MOVE_SITE: &str = "move-site";

/// Reveal a finished download on disk: `[download]`.
pub const OPEN_DOWNLOAD_PATH: &str = "open-download-path";

/// Decrypt a saved password: `[encryptedPassword, authTag, iv, id]`.
pub const DECRYPT_PASSWORD: &str = "decrypt-password";

/// Delete one saved password: `[detail]`.
pub const DELETE_PASSWORD: &str = "delete-password";

/// Re-enable the password manager for a site: `[detail]`.
pub const DELETE_PASSWORD_SITE: &str = "delete-password-site";

/// Delete every saved password.
pub const CLEAR_PASSWORDS: &str = "clear-passwords";

/// Show a notification bar: `[detail]`.
pub const SHOW_NOTIFICATION: &str = "show-notification";

/// Toggle a built-in resource: `[resourceName, enabled]`.
pub const SET_RESOURCE_ENABLED: &str = "set-resource-enabled";

/// Ask the host to emit [`FLASH_UPDATED`].
pub const CHECK_FLASH_INSTALLED: &str = "check-flash-installed";

// ============================================================================
// Outbound (context -> embedder)
// ============================================================================

/// Open a new frame: `[frameOpts, openInForeground]`.
pub const NEW_FRAME: &str = "new-frame";

/// Page opened a context menu: `[nodeProps, contextMenuType]`.
pub const CONTEXT_MENU_OPENED: &str = "context-menu-opened";
