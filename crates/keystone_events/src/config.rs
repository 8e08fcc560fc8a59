//! Runtime settings for an [`EventBridge`](crate::EventBridge)

use serde::{Deserialize, Serialize};

fn default_slow_handler_warn_ms() -> u64 {
    50
}

/// Bridge configuration, usually embedded in the host's TOML config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Log a warning when a single handler runs longer than this (0 disables)
    #[serde(default = "default_slow_handler_warn_ms")]
    pub slow_handler_warn_ms: u64,
    /// Log dispatches that found no subscribers
    #[serde(default)]
    pub warn_on_unhandled: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            slow_handler_warn_ms: default_slow_handler_warn_ms(),
            warn_on_unhandled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.slow_handler_warn_ms, 50);
        assert!(!config.warn_on_unhandled);
    }
}
