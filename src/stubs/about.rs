//! Internal "about:" page commands.
//!
//! Most commands go to the host directly on the process channel rather than
//! through the action dispatcher. Two of them, [`AboutPage::new_frame`] and
//! [`AboutPage::context_menu_opened`], are meant for the embedding window and
//! travel over the bridge, so they are dropped until a counterpart is bound.
//! [`AboutPage::dispatch_action`] forwards a prepared record. Every command
//! is fire-and-forget.
//!
//! The page hears back through ordinary bridge subscriptions: `state-updated`,
//! `decrypted-password` and `flash-updated` parse into
//! [`ParsedEvent`](crate::protocol::ParsedEvent) like every other event.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::bridge::Bridge;
use crate::forwarder::ActionForwarder;
use crate::protocol::{ActionRecord, Frame, names};

// ============================================================================
// AboutPage
// ============================================================================

/// Command surface of an internal page.
#[derive(Clone)]
pub struct AboutPage {
    bridge: Bridge,
    forwarder: ActionForwarder,
}

impl AboutPage {
    /// Creates a page over `bridge` and its transport.
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self {
            forwarder: ActionForwarder::new(Arc::clone(bridge.transport())),
            bridge,
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Changes an application setting.
    pub fn change_setting(&self, key: &str, value: Value) {
        self.send(names::CHANGE_SETTING, vec![text(key), value]);
    }

    /// Changes a setting scoped to `host_pattern`.
    pub fn change_site_setting(&self, host_pattern: &str, key: &str, value: Value) {
        self.send(
            names::CHANGE_SITE_SETTING,
            vec![text(host_pattern), text(key), value],
        );
    }

    /// Enables or disables a built-in resource such as an ad blocker list.
    pub fn set_resource_enabled(&self, resource_name: &str, enabled: bool) {
        self.send(
            names::SET_RESOURCE_ENABLED,
            vec![text(resource_name), Value::Bool(enabled)],
        );
    }

    /// Asks the host to emit the `language` event.
    pub fn request_language(&self) {
        self.send(names::REQUEST_LANGUAGE, Vec::new());
    }

    /// Asks the host to emit `flash-updated`.
    pub fn check_flash_installed(&self) {
        self.send(names::CHECK_FLASH_INSTALLED, Vec::new());
    }

    // ========================================================================
    // Bookmarks and downloads
    // ========================================================================

    /// Moves a bookmark or folder relative to `destination`.
    pub fn move_site(&self, source: Value, destination: Value, prepend: bool, into_parent: bool) {
        self.send(
            names::MOVE_SITE,
            vec![
                source,
                destination,
                Value::Bool(prepend),
                Value::Bool(into_parent),
            ],
        );
    }

    /// Reveals a finished download in the file manager.
    pub fn open_download_path(&self, download: Value) {
        self.send(names::OPEN_DOWNLOAD_PATH, vec![download]);
    }

    // ========================================================================
    // Passwords
    // ========================================================================

    /// Asks the host to decrypt a saved password. The plaintext comes back
    /// as `decrypted-password` carrying the same `id`.
    pub fn decrypt_password(&self, encrypted: &str, auth_tag: &str, iv: &str, id: Value) {
        self.send(
            names::DECRYPT_PASSWORD,
            vec![text(encrypted), text(auth_tag), text(iv), id],
        );
    }

    /// Deletes one saved password.
    pub fn delete_password(&self, detail: Value) {
        self.send(names::DELETE_PASSWORD, vec![detail]);
    }

    /// Removes a site from the never-save list.
    pub fn delete_password_site(&self, detail: Value) {
        self.send(names::DELETE_PASSWORD_SITE, vec![detail]);
    }

    /// Deletes every saved password.
    pub fn clear_passwords(&self) {
        self.send(names::CLEAR_PASSWORDS, Vec::new());
    }

    // ========================================================================
    // Misc
    // ========================================================================

    /// Reports that the user accepted the certificate error for `url`.
    pub fn cert_error_accepted(&self, url: &str) {
        self.send(names::CERT_ERROR_ACCEPTED, vec![text(url)]);
    }

    /// Copies `text` to the clipboard.
    pub fn set_clipboard(&self, value: &str) {
        self.send(names::SET_CLIPBOARD, vec![text(value)]);
    }

    /// Shows a notification bar.
    pub fn show_notification(&self, detail: Value) {
        self.send(names::SHOW_NOTIFICATION, vec![detail]);
    }

    /// Forwards `record` to the host dispatcher.
    pub fn dispatch_action(&self, record: ActionRecord) {
        self.forwarder.dispatch_record(record);
    }

    // ========================================================================
    // Embedder commands
    // ========================================================================

    /// Asks the embedding window to open a new frame.
    pub fn new_frame(&self, frame_opts: Value, open_in_foreground: bool) {
        self.bridge
            .send(names::NEW_FRAME, vec![frame_opts, Value::Bool(open_in_foreground)]);
    }

    /// Tells the embedding window the page opened a context menu.
    pub fn context_menu_opened(&self, node_props: Value, menu_type: &str) {
        self.bridge
            .send(names::CONTEXT_MENU_OPENED, vec![node_props, text(menu_type)]);
    }

    fn send(&self, event: &str, args: Vec<Value>) {
        match self.bridge.transport().send_to_host(Frame::new(event, args)) {
            Ok(()) => trace!(%event, "About page command sent"),
            Err(e) => warn!(%event, error = %e, "Failed to send about page command"),
        }
    }
}

#[inline]
fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

// ============================================================================
// Tests
// ============================================================================
