/// Core EventBridge implementation
use super::registry::HandlerList;
use super::stats::BridgeCounters;
use crate::config::BridgeConfig;
use crate::listener::ListenerId;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Bookkeeping for one registered listener
#[derive(Debug, Clone)]
pub(super) struct ListenerRecord {
    pub(super) name: Arc<str>,
    pub(super) bindings: usize,
}

/// Typed publish/subscribe hub shared by every plugin of the process.
///
/// Handlers are grouped by the exact `TypeId` of the notification they
/// receive. Each group is an immutable, tier-ordered slice behind an `Arc`:
/// writers build a new slice and swap it in under the map's shard lock,
/// while dispatch clones the `Arc` and iterates without holding any lock.
/// A dispatch in progress therefore always sees either the state before or
/// after a concurrent `register`/`unregister`, never a half-updated one.
///
/// Most hosts use the lazily-created [`EventBridge::global`] instance; an
/// explicitly constructed bridge behaves identically and suits tests and
/// hosts that inject their dependencies.
pub struct EventBridge {
    /// Notification type -> ordered bindings
    pub(super) handlers: DashMap<TypeId, HandlerList>,
    /// Registered listener instances
    pub(super) listeners: DashMap<ListenerId, ListenerRecord>,
    pub(super) counters: BridgeCounters,
    /// Held shared by register/unregister and exclusively by clear, so a clear
    /// never lands between a listener's record and its bindings. No listener
    /// code runs while it is held.
    registry_gate: RwLock<()>,
    slow_handler_warn_ms: AtomicU64,
    warn_on_unhandled: AtomicBool,
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("listeners", &self.listeners.len())
            .field("notification_types", &self.handlers.len())
            .field("config", &self.config())
            .finish()
    }
}

impl EventBridge {
    /// Creates an empty bridge with default settings.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Creates an empty bridge with the given settings.
    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            handlers: DashMap::new(),
            listeners: DashMap::new(),
            counters: BridgeCounters::default(),
            registry_gate: RwLock::new(()),
            slow_handler_warn_ms: AtomicU64::new(config.slow_handler_warn_ms),
            warn_on_unhandled: AtomicBool::new(config.warn_on_unhandled),
        }
    }

    /// Applies new settings to a live bridge; takes effect for the next dispatch.
    pub fn configure(&self, config: &BridgeConfig) {
        self.slow_handler_warn_ms
            .store(config.slow_handler_warn_ms, Ordering::Relaxed);
        self.warn_on_unhandled
            .store(config.warn_on_unhandled, Ordering::Relaxed);
    }

    /// Current settings
    pub fn config(&self) -> BridgeConfig {
        BridgeConfig {
            slow_handler_warn_ms: self.slow_handler_warn_ms.load(Ordering::Relaxed),
            warn_on_unhandled: self.warn_on_unhandled.load(Ordering::Relaxed),
        }
    }

    pub(super) fn shared_registry(&self) -> RwLockReadGuard<'_, ()> {
        self.registry_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn exclusive_registry(&self) -> RwLockWriteGuard<'_, ()> {
        self.registry_gate
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(super) fn slow_handler_threshold_ms(&self) -> u64 {
        self.slow_handler_warn_ms.load(Ordering::Relaxed)
    }

    #[inline]
    pub(super) fn logs_unhandled(&self) -> bool {
        self.warn_on_unhandled.load(Ordering::Relaxed)
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}
