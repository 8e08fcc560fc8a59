/// Introspection queries over the registry
use super::core::EventBridge;
use super::registry::BindingSnapshot;
use super::stats::BridgeStats;
use crate::listener::{Listener, ListenerId};
use crate::notification::Notification;
use std::any::TypeId;
use std::sync::Arc;

impl EventBridge {
    /// Number of bindings registered for notification type `E`
    pub fn count_for<E: Notification>(&self) -> usize {
        self.count_for_type(TypeId::of::<E>())
    }

    /// Number of bindings registered for the notification type with this `TypeId`
    pub fn count_for_type(&self, notification: TypeId) -> usize {
        self.handlers
            .get(&notification)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Total number of bindings across all notification types
    pub fn count_total(&self) -> usize {
        self.handlers.iter().map(|list| list.len()).sum()
    }

    /// Number of registered listener instances
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_registered<L: Listener>(&self, listener: &Arc<L>) -> bool {
        self.listeners.contains_key(&ListenerId::of(listener))
    }

    /// Names of the notification types that currently have bindings, sorted
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self
            .handlers
            .iter()
            .map(|list| list.notification())
            .collect();
        types.sort_unstable();
        types
    }

    /// Registered listeners with their binding counts, sorted by name
    pub fn listeners(&self) -> Vec<(String, usize)> {
        let mut listeners: Vec<_> = self
            .listeners
            .iter()
            .map(|record| (record.name.to_string(), record.bindings))
            .collect();
        listeners.sort();
        listeners
    }

    /// Bindings for `E`, highest tier first, registration order within a tier
    pub fn bindings_for<E: Notification>(&self) -> BindingSnapshot {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|list| list.snapshot())
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Current registry sizes and lifetime counters
    pub fn stats(&self) -> BridgeStats {
        let mut stats = BridgeStats {
            listeners: self.listener_count(),
            bindings: self.count_total(),
            notification_types: self.handlers.len(),
            ..BridgeStats::default()
        };
        self.counters.fill(&mut stats);
        stats
    }
}
