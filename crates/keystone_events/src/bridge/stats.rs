/// Statistics tracking for the event bridge
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of bridge activity for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Listeners currently registered
    pub listeners: usize,
    /// Handler bindings currently registered, across all notification types
    pub bindings: usize,
    /// Notification types with at least one binding
    pub notification_types: usize,
    /// Dispatch calls since the bridge was created
    pub notifications_dispatched: u64,
    /// Dispatch calls that returned a cancelled verdict
    pub notifications_cancelled: u64,
    /// Handler invocations, successful or not
    pub handler_invocations: u64,
    /// Handler invocations that returned an error or panicked
    pub handler_failures: u64,
    /// Bindings skipped because the notification was already cancelled
    pub handlers_skipped: u64,
}

#[derive(Debug, Default)]
pub(crate) struct BridgeCounters {
    pub(crate) dispatched: AtomicU64,
    pub(crate) cancelled: AtomicU64,
    pub(crate) invocations: AtomicU64,
    pub(crate) failures: AtomicU64,
    pub(crate) skipped: AtomicU64,
}

impl BridgeCounters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fill(&self, stats: &mut BridgeStats) {
        stats.notifications_dispatched = self.dispatched.load(Ordering::Relaxed);
        stats.notifications_cancelled = self.cancelled.load(Ordering::Relaxed);
        stats.handler_invocations = self.invocations.load(Ordering::Relaxed);
        stats.handler_failures = self.failures.load(Ordering::Relaxed);
        stats.handlers_skipped = self.skipped.load(Ordering::Relaxed);
    }
}
