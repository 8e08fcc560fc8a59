//! # Handler Discovery
//!
//! A listener is any `Send + Sync` value that declares handler methods for
//! one or more notification types. Instead of scanning objects at runtime,
//! each listener enumerates its own handlers in [`Listener::handlers`]; the
//! compiler checks that every handler takes exactly one notification.
//!
//! ```rust
//! use keystone_events::*;
//!
//! #[derive(Debug)]
//! struct PlayerKick { meta: NotificationMeta, reason: String }
//! impl_notification!(PlayerKick: cancellable);
//!
//! struct KickGuard;
//!
//! impl KickGuard {
//!     fn veto_kick(&self, kick: &mut PlayerKick) -> HandlerResult {
//!         if kick.reason == "lag" {
//!             kick.set_cancelled(true)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for KickGuard {
//!     fn handlers(&self, handlers: &mut HandlerSet<Self>) {
//!         handlers.on_with("veto_kick", Priority::High, Self::veto_kick);
//!     }
//! }
//! ```
//!
//! Declarations that cannot be bound are rejected with a warning while the
//! rest of the listener's handlers are still registered.

use crate::error::{HandlerError, HandlerResult};
use crate::notification::Notification;
use crate::priority::Priority;
use crate::utils::short_type_name;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Type-erased handler stored in a binding
pub(crate) type ErasedHandler = dyn Fn(&mut dyn Any) -> HandlerResult + Send + Sync;

/// A component that receives notifications through the bridge.
pub trait Listener: Send + Sync + 'static {
    /// Name used in logs. Defaults to the type name without its module path.
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }

    /// Declares this listener's handler methods.
    fn handlers(&self, handlers: &mut HandlerSet<Self>)
    where
        Self: Sized;
}

/// Identity of a registered listener instance.
///
/// Two `Arc`s pointing at the same allocation have the same id. The bridge
/// holds its own `Arc` while the listener is registered, so the address
/// cannot be reused by another listener in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn of<L: Listener>(listener: &Arc<L>) -> Self {
        ListenerId(Arc::as_ptr(listener) as *const () as usize)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener@{:#x}", self.0)
    }
}

/// Per-handler settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    pub priority: Priority,
    /// Run even when an earlier handler already cancelled the notification
    pub ignore_cancelled: bool,
}

impl HandlerOptions {
    pub const fn new() -> Self {
        Self {
            priority: Priority::Normal,
            ignore_cancelled: false,
        }
    }

    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub const fn ignore_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }
}

impl From<Priority> for HandlerOptions {
    fn from(priority: Priority) -> Self {
        HandlerOptions::new().priority(priority)
    }
}

/// Why a handler declaration was not bound
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("handler method name is empty")]
    EmptyMethodName,
    #[error("method is already declared for this notification type")]
    Duplicate,
}

/// A declaration that discovery refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedHandler {
    pub method: &'static str,
    pub notification: &'static str,
    pub reason: RejectReason,
}

pub(crate) struct HandlerDeclaration<L> {
    pub(crate) method: &'static str,
    pub(crate) notification: &'static str,
    pub(crate) type_id: TypeId,
    pub(crate) options: HandlerOptions,
    call: Box<dyn Fn(&L, &mut dyn Any) -> HandlerResult + Send + Sync>,
}

impl<L: Listener> HandlerDeclaration<L> {
    /// Binds the declaration to a concrete listener instance
    pub(crate) fn bind(
        self,
        listener: Arc<L>,
        listener_id: ListenerId,
        listener_name: Arc<str>,
    ) -> SubscriberBinding {
        let call = self.call;
        SubscriberBinding {
            listener_id,
            listener_name,
            method: self.method,
            notification: self.notification,
            type_id: self.type_id,
            priority: self.options.priority,
            ignore_cancelled: self.options.ignore_cancelled,
            handler: Box::new(move |event: &mut dyn Any| call(&*listener, event)),
        }
    }
}

/// Collects the handler declarations of one listener.
pub struct HandlerSet<L> {
    listener_name: Arc<str>,
    declarations: Vec<HandlerDeclaration<L>>,
    rejected: Vec<RejectedHandler>,
}

impl<L: Listener> HandlerSet<L> {
    pub(crate) fn new(listener_name: Arc<str>) -> Self {
        Self {
            listener_name,
            declarations: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Declares a handler with default options (normal priority, skipped once cancelled).
    pub fn on<E, F>(&mut self, method: &'static str, handler: F) -> &mut Self
    where
        E: Notification,
        F: Fn(&L, &mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_with(method, HandlerOptions::new(), handler)
    }

    /// Declares a handler with explicit options.
    ///
    /// Accepts anything convertible into [`HandlerOptions`], so a bare
    /// [`Priority`] works too.
    pub fn on_with<E, F>(
        &mut self,
        method: &'static str,
        options: impl Into<HandlerOptions>,
        handler: F,
    ) -> &mut Self
    where
        E: Notification,
        F: Fn(&L, &mut E) -> HandlerResult + Send + Sync + 'static,
    {
        let options = options.into();
        let notification = E::type_name();
        let type_id = TypeId::of::<E>();

        if method.trim().is_empty() {
            return self.reject(method, notification, RejectReason::EmptyMethodName);
        }

        if self
            .declarations
            .iter()
            .any(|d| d.method == method && d.type_id == type_id)
        {
            return self.reject(method, notification, RejectReason::Duplicate);
        }

        if options.ignore_cancelled && !E::CANCELLABLE {
            warn!(
                "⚠️ Handler {}::{} sets ignore_cancelled on {}, which cannot be cancelled",
                self.listener_name,
                method,
                short_type_name(notification)
            );
        }

        let call = move |listener: &L, event: &mut dyn Any| match event.downcast_mut::<E>() {
            Some(event) => handler(listener, event),
            None => Err(HandlerError::TypeMismatch {
                expected: notification,
            }),
        };

        debug!(
            "🔎 Found handler {}::{} for {} ({})",
            self.listener_name,
            method,
            short_type_name(notification),
            options.priority
        );

        self.declarations.push(HandlerDeclaration {
            method,
            notification,
            type_id,
            options,
            call: Box::new(call),
        });
        self
    }

    fn reject(
        &mut self,
        method: &'static str,
        notification: &'static str,
        reason: RejectReason,
    ) -> &mut Self {
        warn!(
            "⚠️ Invalid event handler '{}' for {} in {}: {}",
            method,
            short_type_name(notification),
            self.listener_name,
            reason
        );
        self.rejected.push(RejectedHandler {
            method,
            notification,
            reason,
        });
        self
    }

    /// Number of accepted declarations so far
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<HandlerDeclaration<L>>, Vec<RejectedHandler>) {
        (self.declarations, self.rejected)
    }
}

/// One handler method bound to one listener instance.
///
/// Immutable once created; changing a handler's priority means unregistering
/// and registering the listener again.
pub struct SubscriberBinding {
    listener_id: ListenerId,
    listener_name: Arc<str>,
    method: &'static str,
    notification: &'static str,
    type_id: TypeId,
    priority: Priority,
    ignore_cancelled: bool,
    handler: Box<ErasedHandler>,
}

impl SubscriberBinding {
    pub fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    pub fn listener_name(&self) -> &str {
        &self.listener_name
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Full type name of the notification this binding receives
    pub fn notification(&self) -> &'static str {
        self.notification
    }

    pub fn notification_type(&self) -> TypeId {
        self.type_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn ignore_cancelled(&self) -> bool {
        self.ignore_cancelled
    }

    pub(crate) fn invoke(&self, event: &mut dyn Any) -> HandlerResult {
        (self.handler)(event)
    }
}

impl fmt::Debug for SubscriberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberBinding")
            .field("listener", &self.listener_name)
            .field("method", &self.method)
            .field("notification", &short_type_name(self.notification))
            .field("priority", &self.priority)
            .field("ignore_cancelled", &self.ignore_cancelled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationMeta;

    #[derive(Debug)]
    struct AlertToggle {
        meta: NotificationMeta,
    }
    crate::impl_notification!(AlertToggle);

    #[derive(Debug)]
    struct PlayerPunish {
        meta: NotificationMeta,
        points: u32,
    }
    crate::impl_notification!(PlayerPunish: cancellable);

    struct Moderation;

    impl Moderation {
        fn on_toggle(&self, _event: &mut AlertToggle) -> HandlerResult {
            Ok(())
        }

        fn on_punish(&self, event: &mut PlayerPunish) -> HandlerResult {
            event.points += 1;
            Ok(())
        }
    }

    impl Listener for Moderation {
        fn handlers(&self, handlers: &mut HandlerSet<Self>) {
            handlers
                .on("on_toggle", Self::on_toggle)
                .on_with("on_punish", Priority::High, Self::on_punish)
                // same method twice for the same type
                .on("on_punish", Self::on_punish)
                .on("", Self::on_toggle);
        }
    }

    fn discover(listener: &Moderation) -> HandlerSet<Moderation> {
        let mut set = HandlerSet::new(listener.name().into());
        listener.handlers(&mut set);
        set
    }

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(Moderation.name(), "Moderation");
    }

    #[test]
    fn invalid_declarations_are_rejected_individually() {
        let set = discover(&Moderation);
        assert_eq!(set.len(), 2);

        let (declarations, rejected) = set.into_parts();
        assert_eq!(declarations[0].method, "on_toggle");
        assert_eq!(declarations[1].options.priority, Priority::High);

        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].reason, RejectReason::Duplicate);
        assert_eq!(rejected[1].reason, RejectReason::EmptyMethodName);
    }

    #[test]
    fn bound_handler_reaches_listener() {
        let listener = Arc::new(Moderation);
        let set = discover(&listener);
        let (declarations, _) = set.into_parts();
        let punish = declarations
            .into_iter()
            .find(|d| d.method == "on_punish")
            .expect("on_punish declared");

        let binding = punish.bind(
            Arc::clone(&listener),
            ListenerId::of(&listener),
            "Moderation".into(),
        );
        assert_eq!(binding.notification_type(), TypeId::of::<PlayerPunish>());

        let mut event = PlayerPunish {
            meta: NotificationMeta::new(),
            points: 2,
        };
        binding.invoke(&mut event).unwrap();
        assert_eq!(event.points, 3);

        let mut wrong = AlertToggle {
            meta: NotificationMeta::new(),
        };
        assert!(matches!(
            binding.invoke(&mut wrong),
            Err(HandlerError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn listener_ids_follow_the_allocation() {
        let a = Arc::new(Moderation);
        let b = Arc::new(Moderation);
        assert_eq!(ListenerId::of(&a), ListenerId::of(&Arc::clone(&a)));
        assert_ne!(ListenerId::of(&a), ListenerId::of(&b));
    }
}
