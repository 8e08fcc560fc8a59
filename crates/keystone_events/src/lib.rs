//! # Keystone Events
//!
//! A typed, priority-ordered notification bridge for game servers whose
//! features ship as independently loaded plugins. Plugins declare interest in
//! notification types; producers dispatch a notification and learn whether
//! any handler cancelled it.
//!
//! ## Core Features
//!
//! - **Type Safety**: Handlers are keyed by the exact notification type and checked at compile time
//! - **Deterministic Order**: Six priority tiers, registration order within a tier
//! - **Cancellation**: Cancelled notifications skip later handlers unless they opt in
//! - **Observers**: `Monitor` handlers always run last and see the final verdict
//! - **Failure Isolation**: A failing or panicking handler never stops the others
//! - **Lock-free Dispatch**: Copy-on-write handler lists; registration never blocks a dispatch in flight
//!
//! ## Quick Start Example
//!
//! ```rust
//! use keystone_events::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct PlayerKick {
//!     meta: NotificationMeta,
//!     player: String,
//!     reason: String,
//! }
//! impl_notification!(PlayerKick: cancellable);
//!
//! struct LagProtection;
//!
//! impl LagProtection {
//!     fn on_kick(&self, kick: &mut PlayerKick) -> HandlerResult {
//!         if kick.reason.contains("timed out") {
//!             kick.set_cancelled(true)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for LagProtection {
//!     fn handlers(&self, handlers: &mut HandlerSet<Self>) {
//!         listener_handlers!(handlers; on_kick => Priority::High);
//!     }
//! }
//!
//! let bridge = EventBridge::new();
//! bridge.register(Arc::new(LagProtection));
//!
//! let mut kick = PlayerKick {
//!     meta: NotificationMeta::new(),
//!     player: "Notch".into(),
//!     reason: "Connection timed out".into(),
//! };
//! if !bridge.dispatch(&mut kick) {
//!     // go ahead and disconnect the player
//! }
//! assert!(kick.is_cancelled());
//! ```
//!
//! Most hosts share one bridge through [`EventBridge::global`] and call
//! [`EventBridge::shutdown`] when the process stops.

pub mod bridge;
pub mod config;
pub mod error;
pub mod listener;
pub mod macros;
pub mod notification;
pub mod priority;
pub mod utils;

pub use bridge::{BindingSnapshot, BridgeStats, EventBridge, RegistrationSummary, ShutdownSummary};
pub use config::BridgeConfig;
pub use error::{HandlerError, HandlerResult, NotificationError};
pub use listener::{
    HandlerOptions, HandlerSet, Listener, ListenerId, RejectReason, RejectedHandler,
    SubscriberBinding,
};
pub use notification::{Notification, NotificationMeta};
pub use priority::{ParsePriorityError, Priority};
pub use utils::{current_timestamp_millis, short_type_name};
