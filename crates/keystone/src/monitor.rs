//! Periodic bridge health reporting.
//!
//! A background task publishes a [`BridgeHeartbeat`] through the bridge at a
//! fixed interval. [`HealthReporter`] observes it at monitor priority and logs
//! the activity since the previous beat, so plugins can react to the same
//! heartbeat without a second timer.

use keystone_events::{
    impl_notification, listener_handlers, BridgeStats, EventBridge, HandlerResult, HandlerSet,
    Listener, NotificationMeta, Priority,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Published once per monitor interval with a snapshot of the bridge stats.
#[derive(Debug)]
pub struct BridgeHeartbeat {
    meta: NotificationMeta,
    /// 1 for the first beat
    pub sequence: u64,
    pub stats: BridgeStats,
}
impl_notification!(BridgeHeartbeat);

impl BridgeHeartbeat {
    pub fn new(sequence: u64, stats: BridgeStats) -> Self {
        Self {
            meta: NotificationMeta::new(),
            sequence,
            stats,
        }
    }
}

/// Logs a health line for every heartbeat.
#[derive(Debug)]
pub struct HealthReporter {
    high_activity_threshold: u64,
    last_dispatched: AtomicU64,
    last_failures: AtomicU64,
    reports: AtomicU64,
}

impl HealthReporter {
    pub fn new(high_activity_threshold: u64) -> Self {
        Self {
            high_activity_threshold,
            last_dispatched: AtomicU64::new(0),
            last_failures: AtomicU64::new(0),
            reports: AtomicU64::new(0),
        }
    }

    /// Heartbeats reported so far
    pub fn reports(&self) -> u64 {
        self.reports.load(Ordering::Relaxed)
    }

    fn report(&self, beat: &mut BridgeHeartbeat) -> HandlerResult {
        let stats = &beat.stats;
        let dispatched = stats
            .notifications_dispatched
            .saturating_sub(self.last_dispatched.swap(stats.notifications_dispatched, Ordering::Relaxed));
        let failures = stats
            .handler_failures
            .saturating_sub(self.last_failures.swap(stats.handler_failures, Ordering::Relaxed));

        info!(
            "📊 Bridge Health - {} notifications since last report | {} handlers | {} listeners",
            dispatched, stats.bindings, stats.listeners
        );

        if dispatched > self.high_activity_threshold {
            info!(
                "🔥 High activity detected - {} notifications dispatched this interval",
                dispatched
            );
        }

        if failures > 0 {
            warn!("⚠️ {} handler failures since last report", failures);
        }

        self.reports.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Listener for HealthReporter {
    fn handlers(&self, handlers: &mut HandlerSet<Self>) {
        listener_handlers!(handlers; report => Priority::Monitor);
    }
}

/// Spawns the heartbeat task; abort the handle to stop it.
pub fn spawn_monitor(bridge: &'static EventBridge, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;

        let mut sequence = 0u64;
        loop {
            ticker.tick().await;
            sequence += 1;
            let mut beat = BridgeHeartbeat::new(sequence, bridge.stats());
            bridge.dispatch(&mut beat);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn stats(dispatched: u64, failures: u64) -> BridgeStats {
        BridgeStats {
            notifications_dispatched: dispatched,
            handler_failures: failures,
            ..BridgeStats::default()
        }
    }

    #[test]
    fn test_reporter_tracks_deltas() {
        let bridge = EventBridge::new();
        let reporter = Arc::new(HealthReporter::new(5));
        assert_eq!(bridge.register(Arc::clone(&reporter)).accepted, 1);

        bridge.dispatch(&mut BridgeHeartbeat::new(1, stats(3, 0)));
        bridge.dispatch(&mut BridgeHeartbeat::new(2, stats(20, 1)));

        assert_eq!(reporter.reports(), 2);
        assert_eq!(reporter.last_dispatched.load(Ordering::Relaxed), 20);
        assert_eq!(reporter.last_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_reporter_runs_at_monitor_priority() {
        let bridge = EventBridge::new();
        bridge.register(Arc::new(HealthReporter::new(100)));

        let bindings = bridge.bindings_for::<BridgeHeartbeat>();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].priority(), Priority::Monitor);
        assert_eq!(bindings[0].method(), "report");
    }

    #[tokio::test]
    async fn test_monitor_publishes_heartbeats() {
        let bridge: &'static EventBridge = Box::leak(Box::new(EventBridge::new()));
        let reporter = Arc::new(HealthReporter::new(100));
        bridge.register(Arc::clone(&reporter));

        let handle = spawn_monitor(bridge, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(reporter.reports() >= 1);
        assert!(bridge.stats().notifications_dispatched >= 1);
    }
}
