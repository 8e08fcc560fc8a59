//! Main application logic and lifecycle management.
//!
//! The `Application` owns the host configuration, wires it into the
//! process-wide [`EventBridge`], runs the health monitor and tears the bridge
//! down when a termination signal arrives.

use crate::config::{AppConfig, ConfigError};
use crate::logging::display_banner;
use crate::monitor::{spawn_monitor, HealthReporter};
use crate::signals::{wait_for_shutdown_signal, wait_for_shutdown_signal_silent};
use keystone_events::{EventBridge, ShutdownSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Host application bound to one bridge.
pub struct Application {
    config: AppConfig,
    bridge: &'static EventBridge,
}

impl Application {
    /// Validates an already loaded configuration and binds it to the global bridge.
    ///
    /// The process-wide bridge is configured from the `[bridge]` section.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        Ok(Self::with_bridge(config, EventBridge::global()))
    }

    /// Builds an application around an existing bridge.
    pub fn with_bridge(config: AppConfig, bridge: &'static EventBridge) -> Self {
        bridge.configure(&config.bridge);
        Self { config, bridge }
    }

    /// The bridge plugins should register with
    pub fn bridge(&self) -> &'static EventBridge {
        self.bridge
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs until a termination signal arrives, then shuts the bridge down.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Keystone notification bridge");
        self.log_configuration_summary();

        let monitor_handle = if self.config.monitor.enabled {
            let reporter = Arc::new(HealthReporter::new(
                self.config.monitor.high_activity_threshold,
            ));
            self.bridge.register(reporter);
            Some(spawn_monitor(
                self.bridge,
                Duration::from_secs(self.config.monitor.interval_secs),
            ))
        } else {
            None
        };

        let initial = self.bridge.stats();
        info!("📊 Initial Bridge State:");
        info!("  - Listeners registered: {}", initial.listeners);
        info!("  - Handlers registered: {}", initial.bindings);

        info!("✅ Keystone is now running!");
        if monitor_handle.is_some() {
            info!(
                "🔍 Health monitoring active - stats every {} seconds",
                self.config.monitor.interval_secs
            );
        }
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown_signal().await?;

        // a second signal skips the graceful path
        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_signal_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        if let Some(handle) = monitor_handle {
            handle.abort();
        }

        self.shutdown();

        info!("✅ Keystone shutdown complete");
        Ok(())
    }

    /// Unregisters every listener and logs the final statistics.
    pub fn shutdown(&self) -> ShutdownSummary {
        info!(
            "🔌 Unregistering {} event listeners...",
            self.bridge.listener_count()
        );
        let summary = self.bridge.shutdown();
        log_final_statistics(self.bridge);
        summary
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!(
            "  🐌 Slow handler warning: {}",
            match self.config.bridge.slow_handler_warn_ms {
                0 => "disabled".to_string(),
                ms => format!("{ms}ms"),
            }
        );
        info!(
            "  📭 Log unhandled notifications: {}",
            self.config.bridge.warn_on_unhandled
        );
        info!("  📝 Log level: {}", self.config.logging.level);
    }
}

fn log_final_statistics(bridge: &EventBridge) {
    let stats = bridge.stats();
    info!("📊 Final Statistics:");
    info!("  - Notifications dispatched: {}", stats.notifications_dispatched);
    info!("  - Notifications cancelled: {}", stats.notifications_cancelled);
    info!("  - Handler invocations: {}", stats.handler_invocations);
    info!("  - Handler failures: {}", stats.handler_failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;
    use crate::config::MonitorSettings;
    use keystone_events::{
        impl_notification, HandlerResult, HandlerSet, Listener, Notification, NotificationMeta,
        Priority,
    };

    #[derive(Debug)]
    struct PlayerKick {
        meta: NotificationMeta,
        reason: String,
    }
    impl_notification!(PlayerKick: cancellable);

    struct KickGuard;

    impl KickGuard {
        fn on_kick(&self, kick: &mut PlayerKick) -> HandlerResult {
            if kick.reason == "timed out" {
                kick.set_cancelled(true)?;
            }
            Ok(())
        }

        fn audit(&self, _kick: &mut PlayerKick) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for KickGuard {
        fn handlers(&self, handlers: &mut HandlerSet<Self>) {
            handlers
                .on_with("on_kick", Priority::High, Self::on_kick)
                .on_with("audit", Priority::Monitor, Self::audit);
        }
    }

    fn leaked_bridge() -> &'static EventBridge {
        Box::leak(Box::new(EventBridge::new()))
    }

    #[test]
    fn test_bridge_takes_config() {
        let mut config = AppConfig::default();
        config.bridge.slow_handler_warn_ms = 7;
        config.bridge.warn_on_unhandled = true;

        let app = Application::with_bridge(config.clone(), leaked_bridge());
        assert_eq!(app.bridge().config(), config.bridge);
        assert_eq!(app.config(), &config);
    }

    #[test]
    fn test_shutdown_clears_plugins() {
        let config = AppConfig {
            monitor: MonitorSettings {
                enabled: false,
                ..MonitorSettings::default()
            },
            ..AppConfig::default()
        };
        let app = Application::with_bridge(config, leaked_bridge());
        let bridge = app.bridge();

        bridge.register(Arc::new(KickGuard));
        bridge.register(Arc::new(KickGuard));
        let mut kick = PlayerKick {
            meta: NotificationMeta::new(),
            reason: "timed out".to_string(),
        };
        assert!(bridge.dispatch(&mut kick));
        assert!(kick.is_cancelled());

        let summary = app.shutdown();
        assert_eq!(
            summary,
            ShutdownSummary {
                listeners: 2,
                bindings: 4
            }
        );
        assert_eq!(bridge.count_total(), 0);

        // lifetime counters survive the shutdown
        assert_eq!(bridge.stats().notifications_dispatched, 1);
    }

    #[tokio::test]
    async fn test_config_is_read_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = CliArgs {
            config_path: dir.path().join("keystone.toml"),
            log_level: Some("debug".to_string()),
            json_logs: false,
            stats_interval: Some(30),
        };

        let (config, created) = AppConfig::load_for(&args).await.unwrap();
        assert!(created);
        assert!(args.config_path.exists());

        // the application works from the loaded value and never goes back to disk
        std::fs::remove_file(&args.config_path).unwrap();
        let app = Application::new(config).unwrap();
        assert!(!args.config_path.exists());
        assert_eq!(app.config().logging.level, "debug");
        assert_eq!(app.config().monitor.interval_secs, 30);
        assert!(std::ptr::eq(app.bridge(), EventBridge::global()));
    }

    #[tokio::test]
    async fn test_existing_config_is_not_rewritten() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("keystone.toml");
        std::fs::write(&path, "[monitor]\ninterval_secs = 12\n").unwrap();
        let args = CliArgs {
            config_path: path.clone(),
            log_level: None,
            json_logs: true,
            stats_interval: None,
        };

        let (config, created) = AppConfig::load_for(&args).await.unwrap();
        assert!(!created);
        assert_eq!(config.monitor.interval_secs, 12);
        assert!(config.logging.json_format);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[monitor]\ninterval_secs = 12\n"
        );
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = CliArgs {
            config_path: dir.path().join("keystone.toml"),
            log_level: Some("loud".to_string()),
            json_logs: false,
            stats_interval: None,
        };

        let (config, _) = AppConfig::load_for(&args).await.unwrap();
        assert!(matches!(
            Application::new(config),
            Err(ConfigError::Invalid(_))
        ));
    }
}
