//! # Listener Declaration Macros
//!
//! [`listener_handlers!`] declares a listener's handler methods by name, so the
//! method name used in logs always matches the method actually bound.

/// Declares handler methods of the enclosing `impl Listener` block.
///
/// Each entry is a method of `Self` taking `&mut SomeNotification`,
/// optionally followed by `=>` and a [`Priority`](crate::Priority) or
/// [`HandlerOptions`](crate::HandlerOptions).
///
/// ```rust
/// use keystone_events::*;
///
/// #[derive(Debug)]
/// struct StaffVanish { meta: NotificationMeta, vanished: bool }
/// impl_notification!(StaffVanish: cancellable);
///
/// struct VanishAudit;
///
/// impl VanishAudit {
///     fn on_vanish(&self, _event: &mut StaffVanish) -> HandlerResult { Ok(()) }
///     fn record(&self, _event: &mut StaffVanish) -> HandlerResult { Ok(()) }
///     fn late(&self, _event: &mut StaffVanish) -> HandlerResult { Ok(()) }
/// }
///
/// impl Listener for VanishAudit {
///     fn handlers(&self, handlers: &mut HandlerSet<Self>) {
///         listener_handlers!(handlers;
///             on_vanish,
///             record => Priority::Monitor,
///             late => HandlerOptions::new().priority(Priority::Low).ignore_cancelled(),
///         );
///     }
/// }
/// ```
#[macro_export]
macro_rules! listener_handlers {
    (@options) => {
        $crate::HandlerOptions::new()
    };
    (@options $options:expr) => {
        $options
    };
    ($set:expr; $( $method:ident $( => $options:expr )? ),* $(,)?) => {{
        let set = &mut *$set;
        $(
            set.on_with(
                stringify!($method),
                $crate::listener_handlers!(@options $( $options )?),
                Self::$method,
            );
        )*
    }};
}

#[cfg(test)]
mod tests {
    use crate::{HandlerResult, HandlerSet, Listener, NotificationMeta, Priority};

    #[derive(Debug)]
    struct PlayerReport {
        meta: NotificationMeta,
    }
    crate::impl_notification!(PlayerReport: cancellable);

    struct ReportDesk;

    impl ReportDesk {
        fn triage(&self, _event: &mut PlayerReport) -> HandlerResult {
            Ok(())
        }

        fn archive(&self, _event: &mut PlayerReport) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for ReportDesk {
        fn handlers(&self, handlers: &mut HandlerSet<Self>) {
            crate::listener_handlers!(handlers;
                triage => Priority::High,
                archive,
            );
            // the set stays usable after the macro
            assert_eq!(handlers.len(), 2);
        }
    }

    #[test]
    fn macro_declares_named_handlers() {
        let desk = ReportDesk;
        let mut set = HandlerSet::new("ReportDesk".into());
        desk.handlers(&mut set);

        let (declarations, rejected) = set.into_parts();
        assert!(rejected.is_empty());
        assert_eq!(declarations[0].method, "triage");
        assert_eq!(declarations[0].options.priority, Priority::High);
        assert_eq!(declarations[1].method, "archive");
        assert_eq!(declarations[1].options.priority, Priority::Normal);
    }
}
