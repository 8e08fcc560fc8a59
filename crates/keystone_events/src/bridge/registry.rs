/// Listener registration and the copy-on-write handler lists
use super::core::{EventBridge, ListenerRecord};
use crate::error::HandlerError;
use crate::listener::{HandlerSet, Listener, ListenerId, RejectedHandler, SubscriberBinding};
use crate::utils::short_type_name;
use dashmap::mapref::entry::Entry;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Immutable snapshot of the bindings for one notification type
pub type BindingSnapshot = Arc<[Arc<SubscriberBinding>]>;

/// Bindings for one notification type, ordered by tier (highest first) and
/// then by registration order.
pub(crate) struct HandlerList {
    notification: &'static str,
    bindings: BindingSnapshot,
}

impl HandlerList {
    pub(crate) fn new(notification: &'static str) -> Self {
        Self {
            notification,
            bindings: Arc::from(Vec::new()),
        }
    }

    pub(crate) fn notification(&self) -> &'static str {
        self.notification
    }

    #[inline]
    pub(crate) fn snapshot(&self) -> BindingSnapshot {
        Arc::clone(&self.bindings)
    }

    /// Publishes a new list containing `binding`.
    ///
    /// The binding goes after every existing binding of the same or a higher
    /// tier, which keeps same-tier bindings in arrival order.
    pub(crate) fn insert(&mut self, binding: Arc<SubscriberBinding>) {
        let mut next = self.bindings.to_vec();
        let at = next.partition_point(|b| b.priority() >= binding.priority());
        next.insert(at, binding);
        self.bindings = next.into();
    }

    /// Publishes a new list without the bindings of `listener`.
    ///
    /// Returns the replaced list, or `None` when the listener had nothing
    /// here. It may hold the last reference to the listener, so callers drop
    /// it only after releasing every map guard.
    pub(crate) fn remove_listener(&mut self, listener: ListenerId) -> Option<BindingSnapshot> {
        if !self.bindings.iter().any(|b| b.listener_id() == listener) {
            return None;
        }
        let next: Vec<_> = self
            .bindings
            .iter()
            .filter(|b| b.listener_id() != listener)
            .cloned()
            .collect();
        Some(std::mem::replace(&mut self.bindings, next.into()))
    }

    /// Empties the list and hands back what it held.
    pub(crate) fn take(&mut self) -> BindingSnapshot {
        std::mem::replace(&mut self.bindings, Arc::from(Vec::new()))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Outcome of [`EventBridge::register`]
#[derive(Debug, Clone)]
pub struct RegistrationSummary {
    pub listener: ListenerId,
    pub listener_name: String,
    /// Bindings added to the bridge
    pub accepted: usize,
    /// Declarations discovery refused
    pub rejected: Vec<RejectedHandler>,
    /// The instance was already registered; nothing changed
    pub already_registered: bool,
}

impl EventBridge {
    /// Registers every handler the listener declares.
    ///
    /// Declarations that fail validation are skipped with a warning; the
    /// listener's other handlers are still bound. A listener without any
    /// handlers is registered but contributes no bindings. Registering the
    /// same instance twice is a no-op.
    pub fn register<L: Listener>(&self, listener: Arc<L>) -> RegistrationSummary {
        let id = ListenerId::of(&listener);
        let name: Arc<str> = Arc::from(listener.name());

        // discovery is listener code and runs before any registry lock is taken
        let mut set = HandlerSet::new(Arc::clone(&name));
        let discovered = catch_unwind(AssertUnwindSafe(|| listener.handlers(&mut set)));
        if let Err(payload) = discovered {
            error!(
                "❌ Listener {} failed while declaring handlers: {}",
                name,
                HandlerError::from_panic(payload)
            );
            return RegistrationSummary {
                listener: id,
                listener_name: name.to_string(),
                accepted: 0,
                rejected: Vec::new(),
                already_registered: false,
            };
        }
        let (declarations, rejected) = set.into_parts();

        let gate = self.shared_registry();
        match self.listeners.entry(id) {
            Entry::Occupied(_) => {
                drop(gate);
                warn!("⚠️ Listener {} is already registered, ignoring", name);
                return RegistrationSummary {
                    listener: id,
                    listener_name: name.to_string(),
                    accepted: 0,
                    rejected: Vec::new(),
                    already_registered: true,
                };
            }
            Entry::Vacant(slot) => {
                slot.insert(ListenerRecord {
                    name: Arc::clone(&name),
                    bindings: 0,
                });
            }
        }

        let mut accepted = 0;
        for declaration in declarations {
            let binding = Arc::new(declaration.bind(Arc::clone(&listener), id, Arc::clone(&name)));
            debug!(
                "📝 Bound {}::{} to {} at {} priority",
                name,
                binding.method(),
                short_type_name(binding.notification()),
                binding.priority()
            );
            self.handlers
                .entry(binding.notification_type())
                .or_insert_with(|| HandlerList::new(binding.notification()))
                .insert(binding);
            accepted += 1;
        }

        let mut released = Vec::new();
        let recorded = match self.listeners.get_mut(&id) {
            Some(mut record) => {
                record.bindings = accepted;
                true
            }
            None => false,
        };
        if !recorded {
            // unregistered while we were binding
            let dropped = self.remove_bindings_of(id, &mut released);
            debug!(
                "Listener {} went away during registration, dropped {} bindings",
                name, dropped
            );
        }
        drop(gate);
        drop(released);

        info!(
            "📝 Registered listener: {} ({} handlers{})",
            name,
            accepted,
            if rejected.is_empty() {
                String::new()
            } else {
                format!(", {} rejected", rejected.len())
            }
        );

        RegistrationSummary {
            listener: id,
            listener_name: name.to_string(),
            accepted,
            rejected,
            already_registered: false,
        }
    }

    /// Removes every binding owned by the listener.
    ///
    /// Returns the number of bindings removed; unregistering a listener that
    /// is not registered returns 0.
    pub fn unregister<L: Listener>(&self, listener: &Arc<L>) -> usize {
        self.unregister_id(ListenerId::of(listener))
    }

    /// Same as [`EventBridge::unregister`], keyed by the id from a [`RegistrationSummary`].
    pub fn unregister_id(&self, id: ListenerId) -> usize {
        let mut released = Vec::new();
        let gate = self.shared_registry();
        let Some((_, record)) = self.listeners.remove(&id) else {
            drop(gate);
            debug!("Unregister ignored, {} is not registered", id);
            return 0;
        };
        let removed = self.remove_bindings_of(id, &mut released);
        drop(gate);

        info!(
            "🗑️ Unregistered listener: {} ({} handlers removed)",
            record.name, removed
        );
        // listener Drop impls may call back into the bridge
        drop(released);
        removed
    }

    /// Moves the listener's bindings out of every list into `released`.
    fn remove_bindings_of(&self, id: ListenerId, released: &mut Vec<BindingSnapshot>) -> usize {
        let mut removed = 0;
        self.handlers.retain(|_, list| {
            if let Some(previous) = list.remove_listener(id) {
                removed += previous.len() - list.len();
                released.push(previous);
            }
            !list.is_empty()
        });
        removed
    }
}
