//! Bridge configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use embedder_bridge::BridgeOptions;
//!
//! let options = BridgeOptions::new()
//!     .with_expected_origin("chrome-extension://mnojpmjdmbbfmejpflffifhffcmidifd")
//!     .with_query_timeout(Duration::from_millis(250));
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Origin of privileged host pages loaded from disk.
pub const DEFAULT_EXPECTED_ORIGIN: &str = "file://";

/// Default timeout for synchronous queries.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on in-flight synchronous queries.
pub const DEFAULT_MAX_PENDING_QUERIES: usize = 100;

// ============================================================================
// ZoomBounds
// ============================================================================

/// Inclusive zoom level range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomBounds {
    /// Lowest reachable level.
    pub min: i32,
    /// Highest reachable level.
    pub max: i32,
}

impl ZoomBounds {
    /// Creates bounds.
    #[inline]
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `level` lies within the bounds.
    #[inline]
    #[must_use]
    pub const fn contains(&self, level: i32) -> bool {
        self.min <= level && level <= self.max
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self::new(-8, 9)
    }
}

// ============================================================================
// BridgeOptions
// ============================================================================

/// Per-context bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// The single origin inbound messages must declare.
    pub expected_origin: String,

    /// How long a synchronous query waits for its reply.
    pub query_timeout: Duration,

    /// Maximum in-flight synchronous queries.
    pub max_pending_queries: usize,

    /// Zoom level range.
    pub zoom_bounds: ZoomBounds,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            expected_origin: DEFAULT_EXPECTED_ORIGIN.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_pending_queries: DEFAULT_MAX_PENDING_QUERIES,
            zoom_bounds: ZoomBounds::default(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trusted origin.
    #[inline]
    #[must_use]
    pub fn with_expected_origin(mut self, origin: impl Into<String>) -> Self {
        self.expected_origin = origin.into();
        self
    }

    /// Sets the synchronous query timeout.
    #[inline]
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Sets the in-flight query cap.
    #[inline]
    #[must_use]
    pub fn with_max_pending_queries(mut self, max: usize) -> Self {
        self.max_pending_queries = max;
        self
    }

    /// Sets the zoom range.
    #[inline]
    #[must_use]
    pub fn with_zoom_bounds(mut self, min: i32, max: i32) -> Self {
        self.zoom_bounds = ZoomBounds::new(min, max);
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl BridgeOptions {
    /// Checks the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty origin, a zero timeout or
    /// query cap, or zoom bounds that exclude the default level 0.
    pub fn validate(&self) -> Result<()> {
        if self.expected_origin.trim().is_empty() {
            return Err(Error::config("expected origin must not be empty"));
        }

        if self.query_timeout.is_zero() {
            return Err(Error::config("query timeout must be non-zero"));
        }

        if self.max_pending_queries == 0 {
            return Err(Error::config("max pending queries must be non-zero"));
        }

        if !self.zoom_bounds.contains(0) {
            return Err(Error::config(format!(
                "zoom bounds [{}, {}] must contain 0",
                self.zoom_bounds.min, self.zoom_bounds.max
            )));
        }

        Ok(())
    }

    /// Returns the query timeout in milliseconds, saturating at `u64::MAX`.
    #[inline]
    #[must_use]
    pub fn query_timeout_ms(&self) -> u64 {
        u64::try_from(self.query_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================
