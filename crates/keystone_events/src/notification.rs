//! # Notification Model
//!
//! Every value that travels through the bridge implements [`Notification`].
//! A notification carries a [`NotificationMeta`] header with its creation
//! time and, for cancellable types, the cancelled flag that handlers flip to
//! tell the producer to abort whatever the notification describes.
//!
//! Whether a type is cancellable is fixed when the type is defined, through
//! the [`Notification::CANCELLABLE`] constant. The trait's provided methods
//! guard every access to the flag with that constant, so a non-cancellable
//! notification always reports `is_cancelled() == false` and refuses
//! `set_cancelled`.
//!
//! ```rust
//! use keystone_events::{impl_notification, Notification, NotificationMeta};
//!
//! #[derive(Debug)]
//! struct PlayerKick {
//!     meta: NotificationMeta,
//!     reason: String,
//! }
//!
//! impl_notification!(PlayerKick: cancellable);
//!
//! let mut kick = PlayerKick { meta: NotificationMeta::new(), reason: "flying".into() };
//! assert!(kick.is_cancellable());
//! kick.set_cancelled(true).unwrap();
//! assert!(kick.is_cancelled());
//! ```

use crate::error::NotificationError;
use crate::utils::current_timestamp_millis;
use std::any::Any;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Header shared by every notification.
///
/// The cancelled flag is private to the crate; authors reach it only through
/// [`Notification::is_cancelled`] and [`Notification::set_cancelled`].
#[derive(Debug, Clone)]
pub struct NotificationMeta {
    created_at: Instant,
    timestamp_ms: u64,
    cancelled: bool,
}

impl NotificationMeta {
    /// Stamps a fresh header with the current monotonic and wall-clock time.
    pub fn new() -> Self {
        Self {
            created_at: Instant::now(),
            timestamp_ms: current_timestamp_millis(),
            cancelled: false,
        }
    }

    /// Monotonic creation instant
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Wall-clock creation time in milliseconds since the Unix epoch
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

impl Default for NotificationMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Base contract for every dispatched value.
///
/// Implement it with [`impl_notification!`](crate::impl_notification) unless
/// the header lives somewhere unusual.
pub trait Notification: Any + Send + Sync + Debug {
    /// Whether handlers may cancel this notification type.
    const CANCELLABLE: bool;

    /// Read access to the header
    fn meta(&self) -> &NotificationMeta;

    /// Write access to the header
    fn meta_mut(&mut self) -> &mut NotificationMeta;

    /// Stable type name used in logs and diagnostics
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    fn created_at(&self) -> Instant {
        self.meta().created_at()
    }

    fn timestamp_ms(&self) -> u64 {
        self.meta().timestamp_ms()
    }

    /// Time elapsed since the notification was constructed
    fn age(&self) -> Duration {
        self.meta().created_at().elapsed()
    }

    fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE
    }

    /// Always `false` for non-cancellable types.
    fn is_cancelled(&self) -> bool {
        Self::CANCELLABLE && self.meta().cancelled
    }

    /// Sets the cancelled flag.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::NotCancellable`] when the type was not
    /// declared cancellable; the flag is left untouched.
    fn set_cancelled(&mut self, cancelled: bool) -> Result<(), NotificationError>
    where
        Self: Sized,
    {
        if !Self::CANCELLABLE {
            return Err(NotificationError::NotCancellable(Self::type_name()));
        }
        self.meta_mut().cancelled = cancelled;
        Ok(())
    }
}

/// Implements [`Notification`] for a struct with a `meta: NotificationMeta` field.
///
/// ```rust
/// use keystone_events::{impl_notification, NotificationMeta};
///
/// #[derive(Debug)]
/// struct AlertToggle { meta: NotificationMeta, enabled: bool }
/// #[derive(Debug)]
/// struct PlayerFreeze { meta: NotificationMeta, freezing: bool }
///
/// impl_notification!(AlertToggle);
/// impl_notification!(PlayerFreeze: cancellable);
/// ```
#[macro_export]
macro_rules! impl_notification {
    (@impl $ty:ty, $cancellable:expr) => {
        impl $crate::Notification for $ty {
            const CANCELLABLE: bool = $cancellable;

            fn meta(&self) -> &$crate::NotificationMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::NotificationMeta {
                &mut self.meta
            }
        }
    };
    ($ty:ty: cancellable) => {
        $crate::impl_notification!(@impl $ty, true);
    };
    ($ty:ty) => {
        $crate::impl_notification!(@impl $ty, false);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ServerTick {
        meta: NotificationMeta,
    }
    crate::impl_notification!(ServerTick);

    #[derive(Debug)]
    struct PlayerPunish {
        meta: NotificationMeta,
    }
    crate::impl_notification!(PlayerPunish: cancellable);

    #[test]
    fn plain_notifications_refuse_cancellation() {
        let mut tick = ServerTick { meta: NotificationMeta::new() };
        assert!(!tick.is_cancellable());
        assert_eq!(
            tick.set_cancelled(true),
            Err(NotificationError::NotCancellable(ServerTick::type_name()))
        );
        assert!(!tick.is_cancelled());
    }

    #[test]
    fn cancellable_notifications_start_uncancelled() {
        let mut punish = PlayerPunish { meta: NotificationMeta::new() };
        assert!(punish.is_cancellable());
        assert!(!punish.is_cancelled());

        punish.set_cancelled(true).unwrap();
        assert!(punish.is_cancelled());
        punish.set_cancelled(false).unwrap();
        assert!(!punish.is_cancelled());
    }

    #[test]
    fn header_is_stamped_at_construction() {
        let before = Instant::now();
        let tick = ServerTick { meta: NotificationMeta::new() };
        assert!(tick.created_at() >= before);
        assert!(tick.timestamp_ms() > 0);
        assert!(tick.age() < Duration::from_secs(5));
    }
}
