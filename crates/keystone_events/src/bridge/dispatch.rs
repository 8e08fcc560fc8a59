/// Notification dispatch
use super::core::EventBridge;
use super::stats::BridgeCounters;
use crate::error::HandlerError;
use crate::listener::SubscriberBinding;
use crate::notification::Notification;
use crate::utils::short_type_name;
use std::any::TypeId;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, trace, warn};

impl EventBridge {
    /// Delivers a notification to every binding registered for its exact type.
    ///
    /// Bindings run synchronously on the calling thread, highest tier first
    /// and in registration order within a tier. Once a handler cancels the
    /// notification, the remaining bindings are skipped unless they were
    /// declared with `ignore_cancelled`. [`Priority::Monitor`](crate::Priority::Monitor)
    /// bindings run last, unconditionally, and see the final verdict.
    ///
    /// A handler that returns an error or panics is logged with its listener's
    /// name and the dispatch carries on with the next binding.
    ///
    /// Returns whether the notification ended up cancelled. Non-cancellable
    /// notifications always return `false`.
    pub fn dispatch<E: Notification>(&self, notification: &mut E) -> bool {
        BridgeCounters::bump(&self.counters.dispatched);

        let snapshot = match self.handlers.get(&TypeId::of::<E>()) {
            Some(list) => list.snapshot(),
            None => {
                if self.logs_unhandled() {
                    debug!("📭 No handlers for {}", short_type_name(E::type_name()));
                }
                return false;
            }
        };
        // shard guard is released here; handlers may register or dispatch freely

        trace!(
            "📤 Dispatching {} to {} handlers",
            short_type_name(E::type_name()),
            snapshot.len()
        );

        // Monitor bindings sort first; the main pass starts after them.
        let observers = snapshot.partition_point(|b| b.priority().is_monitor());
        let (monitors, main) = snapshot.split_at(observers);

        for binding in main {
            if notification.is_cancelled() && !binding.ignore_cancelled() {
                BridgeCounters::bump(&self.counters.skipped);
                trace!(
                    "⏭️ Skipping {}::{} for cancelled {}",
                    binding.listener_name(),
                    binding.method(),
                    short_type_name(E::type_name())
                );
                continue;
            }
            self.invoke(binding, notification);
        }

        for binding in monitors {
            self.invoke(binding, notification);
        }

        let cancelled = notification.is_cancelled();
        if cancelled {
            BridgeCounters::bump(&self.counters.cancelled);
            debug!(
                "🚫 {} was cancelled",
                short_type_name(E::type_name())
            );
        }
        cancelled
    }

    fn invoke<E: Notification>(&self, binding: &SubscriberBinding, notification: &mut E) {
        BridgeCounters::bump(&self.counters.invocations);

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| binding.invoke(notification)))
            .unwrap_or_else(|payload| Err(HandlerError::from_panic(payload)));
        let elapsed = started.elapsed();

        if let Err(e) = outcome {
            BridgeCounters::bump(&self.counters.failures);
            error!(
                "❌ Error dispatching {} to {}::{}: {}",
                short_type_name(binding.notification()),
                binding.listener_name(),
                binding.method(),
                e
            );
        }

        let threshold = self.slow_handler_threshold_ms();
        if threshold > 0 && elapsed.as_millis() > u128::from(threshold) {
            warn!(
                "🐌 Handler {}::{} took {:?} for {}",
                binding.listener_name(),
                binding.method(),
                elapsed,
                short_type_name(binding.notification())
            );
        }
    }
}
