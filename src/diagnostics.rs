//! Injected diagnostics hooks for the placement loop.

use crate::element::ElementKey;
use crate::prefilter::PlacementResult;
use crate::renderer::FrameStats;

/// Receives per-frame placement events. All methods default to no-ops.
pub trait Diagnostics {
    /// Called for every candidate that did not pass the pre-filter.
    fn candidate_rejected(&self, _key: ElementKey, _result: PlacementResult) {}

    /// Called when an Ok candidate lost the collision test.
    fn candidate_collided(&self, _key: ElementKey) {}

    /// Called once at the end of each placed frame.
    fn frame_placed(&self, _frame: u64, _stats: &FrameStats) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn candidate_rejected(&self, key: ElementKey, result: PlacementResult) {
        log::trace!("label {:?} rejected: {:?}", key, result);
    }

    fn candidate_collided(&self, key: ElementKey) {
        log::trace!("label {:?} collided", key);
    }

    fn frame_placed(&self, frame: u64, stats: &FrameStats) {
        log::debug!(
            "frame {}: {} candidates, {} placed, {} fading out, {} collided, {} not ready",
            frame,
            stats.candidates,
            stats.placed,
            stats.fading_out,
            stats.collided,
            stats.not_ready
        );
    }
}
