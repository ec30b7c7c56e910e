//! Zoom State Replicator.
//!
//! Mirrors a per-page zoom level driven entirely by host commands. The level
//! starts at 0 and stays within [`ZoomBounds`]. Every command re-applies the
//! resulting level to the renderer, including commands that left it
//! unchanged at a bound.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::protocol::{ParsedEvent, names};

use super::core::Bridge;
use super::options::ZoomBounds;

// ============================================================================
// Renderer
// ============================================================================

/// The page's rendering engine, as far as zoom is concerned.
pub trait Renderer: Send + Sync {
    /// Applies `level` to the page.
    fn set_zoom_level(&self, level: i32);
}

// ============================================================================
// ZoomCommand
// ============================================================================

/// Host-originated zoom commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomCommand {
    /// One step larger.
    In,
    /// One step smaller.
    Out,
    /// Back to the default scale.
    Reset,
}

impl ZoomCommand {
    /// Every command with its event name.
    const ROUTES: [(&'static str, ZoomCommand); 3] = [
        (names::ZOOM_IN, Self::In),
        (names::ZOOM_OUT, Self::Out),
        (names::ZOOM_RESET, Self::Reset),
    ];

    /// Maps a parsed event to a command.
    #[must_use]
    pub fn from_event(event: &ParsedEvent) -> Option<Self> {
        match event {
            ParsedEvent::ZoomIn => Some(Self::In),
            ParsedEvent::ZoomOut => Some(Self::Out),
            ParsedEvent::ZoomReset => Some(Self::Reset),
            _ => None,
        }
    }
}

// ============================================================================
// ZoomReplicator
// ============================================================================

/// Per-context zoom level.
pub struct ZoomReplicator {
    level: Mutex<i32>,
    bounds: ZoomBounds,
    renderer: Arc<dyn Renderer>,
}

impl ZoomReplicator {
    /// Creates a replicator at level 0.
    #[must_use]
    pub fn new(bounds: ZoomBounds, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            level: Mutex::new(0),
            bounds,
            renderer,
        }
    }

    /// Creates a replicator and registers its three commands on `bridge`.
    #[must_use]
    pub fn attach(bridge: &Bridge, bounds: ZoomBounds, renderer: Arc<dyn Renderer>) -> Arc<Self> {
        let replicator = Arc::new(Self::new(bounds, renderer));

        for (event, command) in ZoomCommand::ROUTES {
            let target = Arc::clone(&replicator);
            bridge.on(event, move |_| {
                target.apply(command);
            });
        }

        replicator
    }

    /// Returns the current level.
    #[inline]
    #[must_use]
    pub fn level(&self) -> i32 {
        *self.level.lock()
    }

    /// Returns the bounds.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    /// Applies `command` and re-asserts the level on the renderer.
    ///
    /// Returns the resulting level.
    pub fn apply(&self, command: ZoomCommand) -> i32 {
        let level = {
            let mut level = self.level.lock();
            match command {
                ZoomCommand::In if *level < self.bounds.max => *level += 1,
                ZoomCommand::Out if *level > self.bounds.min => *level -= 1,
                ZoomCommand::Reset => *level = 0,
                _ => {}
            }
            *level
        };

        debug!(?command, level, "Zoom level applied");
        self.renderer.set_zoom_level(level);
        level
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bridge::BridgeOptions;
    use crate::protocol::{Envelope, Frame};
    use crate::transport::ChannelTransport;

    #[derive(Default)]
    struct RecordingRenderer {
        applied: Mutex<Vec<i32>>,
    }

    impl Renderer for RecordingRenderer {
        fn set_zoom_level(&self, level: i32) {
            self.applied.lock().push(level);
        }
    }

    fn replicator() -> (ZoomReplicator, Arc<RecordingRenderer>) {
        let renderer = Arc::new(RecordingRenderer::default());
        (
            ZoomReplicator::new(ZoomBounds::default(), renderer.clone()),
            renderer,
        )
    }

    #[test]
    fn test_zoom_in_clamps_at_max() {
        let (zoom, _) = replicator();
        for _ in 0..9 {
            zoom.apply(ZoomCommand::In);
        }
        assert_eq!(zoom.level(), 9);

        assert_eq!(zoom.apply(ZoomCommand::In), 9);
    }

    #[test]
    fn test_zoom_out_clamps_at_min() {
        let (zoom, _) = replicator();
        for _ in 0..9 {
            zoom.apply(ZoomCommand::In);
        }
        for _ in 0..8 {
            zoom.apply(ZoomCommand::Out);
        }
        assert_eq!(zoom.level(), 1);

        for _ in 0..9 {
            zoom.apply(ZoomCommand::Out);
        }
        assert_eq!(zoom.level(), -8);
    }

    #[test]
    fn test_reset_from_any_level() {
        let (zoom, _) = replicator();
        for steps in [0, 3, 9, 12] {
            for _ in 0..steps {
                zoom.apply(ZoomCommand::In);
            }
            assert_eq!(zoom.apply(ZoomCommand::Reset), 0);
        }
        for _ in 0..20 {
            zoom.apply(ZoomCommand::Out);
        }
        assert_eq!(zoom.apply(ZoomCommand::Reset), 0);
    }

    #[test]
    fn test_noop_still_reapplies() {
        let (zoom, renderer) = replicator();
        zoom.apply(ZoomCommand::Reset);
        zoom.apply(ZoomCommand::Reset);

        assert_eq!(*renderer.applied.lock(), vec![0, 0]);
    }

    #[test]
    fn test_attach_routes_commands() {
        let (transport, _host) = ChannelTransport::pair();
        let bridge = Bridge::new(&BridgeOptions::new(), Arc::new(transport)).expect("valid options");
        let renderer = Arc::new(RecordingRenderer::default());
        let zoom = ZoomReplicator::attach(&bridge, ZoomBounds::default(), renderer.clone());

        for event in ["zoom-in", "zoom-in", "zoom-out", "zoom-sideways", "zoom-reset"] {
            bridge.receive(Envelope::new("file://", "embedder", &Frame::bare(event)));
        }

        assert_eq!(zoom.level(), 0);
        assert_eq!(*renderer.applied.lock(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_from_event() {
        assert_eq!(
            ZoomCommand::from_event(&ParsedEvent::ZoomOut),
            Some(ZoomCommand::Out)
        );
        assert_eq!(
            ZoomCommand::from_event(&ParsedEvent::SettingsUpdated(serde_json::Value::Null)),
            None
        );
    }
}
