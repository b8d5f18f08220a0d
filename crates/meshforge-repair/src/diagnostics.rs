//! Structured diagnostics for repair and sweep operations.
//!
//! The repair core stays side-effect-free: instead of global debug flags,
//! callers inject a [`DiagnosticsSink`] and receive structured events. The
//! pipeline also mirrors events to `tracing` so that existing subscribers
//! see them without wiring a sink.

use tracing::debug;

/// A structured diagnostic event emitted by the repair or sweep pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagEvent {
    /// Vertices merged by welding.
    VerticesWelded {
        /// Number of vertices merged away.
        count: usize,
    },
    /// Degenerate or invalid faces dropped.
    FacesDropped {
        /// Number of faces dropped.
        count: usize,
    },
    /// T-junction insertion points applied.
    SplitsApplied {
        /// Number of edge insertion points.
        count: usize,
    },
    /// Duplicate (overlapping) faces removed.
    OverlapsRemoved {
        /// Number of faces removed.
        count: usize,
    },
    /// Boundary loops filled with patch triangles.
    HolesFilled {
        /// Number of loops filled.
        count: usize,
    },
    /// Faces flipped by winding normalization.
    FacesFlipped {
        /// Number of faces flipped.
        count: usize,
    },
    /// Non-manifold edges detected. Reported, never auto-resolved.
    NonManifoldEdges {
        /// Number of edges used by more than two faces.
        count: usize,
    },
    /// Manifold finalization failed and the weld epsilon was escalated.
    RetryEscalated {
        /// 1-based retry attempt.
        attempt: usize,
    },
}

/// Receiver for structured diagnostic events.
pub trait DiagnosticsSink {
    /// Record one event.
    fn report(&mut self, event: DiagEvent);
}

/// A sink that discards all events.
///
/// Events are still mirrored to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn report(&mut self, event: DiagEvent) {
        debug!(?event, "repair diagnostic");
    }
}

/// A sink that collects events into a vector, for tests and callers that
/// want to inspect what the pipeline did.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// All events reported so far, in order.
    pub events: Vec<DiagEvent>,
}

impl CollectingSink {
    /// Create an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any event of the given kind was reported.
    #[must_use]
    pub fn contains(&self, predicate: impl Fn(&DiagEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&mut self, event: DiagEvent) {
        debug!(?event, "repair diagnostic");
        self.events.push(event);
    }
}
