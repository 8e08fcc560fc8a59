/// Process-wide instance and shutdown
use super::core::EventBridge;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

static GLOBAL: Lazy<EventBridge> = Lazy::new(|| {
    debug!("🌉 Creating process-wide event bridge");
    EventBridge::new()
});

/// What [`EventBridge::shutdown`] cleared
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownSummary {
    pub listeners: usize,
    pub bindings: usize,
}

impl ShutdownSummary {
    pub fn is_empty(&self) -> bool {
        self.listeners == 0 && self.bindings == 0
    }
}

impl EventBridge {
    /// The bridge shared by every component of the process, created on first use.
    pub fn global() -> &'static EventBridge {
        &GLOBAL
    }

    /// Drops every binding and listener record.
    ///
    /// Dispatches already in progress finish with the snapshot they took.
    /// Registrations racing the clear either finish before it or start after
    /// it. Listeners are dropped once every registry lock is released.
    pub fn clear(&self) -> ShutdownSummary {
        let mut released = Vec::new();
        let gate = self.exclusive_registry();

        let listeners = self.listeners.len();
        self.listeners.clear();

        let mut bindings = 0;
        self.handlers.retain(|_, list| {
            let previous = list.take();
            bindings += previous.len();
            released.push(previous);
            false
        });

        drop(gate);
        drop(released);
        ShutdownSummary { listeners, bindings }
    }

    /// Clears the registry and logs what was released.
    ///
    /// The bridge stays usable; listeners may register again afterwards.
    /// Calling it on an empty bridge only logs.
    pub fn shutdown(&self) -> ShutdownSummary {
        let summary = self.clear();
        if summary.is_empty() {
            info!("🛑 Event bridge shutdown: nothing registered");
        } else {
            info!(
                "🛑 Event bridge shutdown: cleared {} listeners and {} handlers",
                summary.listeners, summary.bindings
            );
        }
        summary
    }
}
