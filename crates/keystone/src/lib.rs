//! # Keystone - Host Entry Point
//!
//! Hosts the process-wide notification bridge shared by game server plugins.
//! This entry point handles CLI parsing, configuration loading, logging setup
//! and application lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! keystone
//!
//! # Specify custom configuration
//! keystone --config production.toml
//!
//! # Override specific settings
//! keystone --log-level debug --stats-interval 30
//!
//! # JSON logging for production
//! keystone --json-logs
//! ```
//!
//! ## Configuration
//!
//! Configuration is read from a TOML file (default: `keystone.toml`). If the
//! file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! On SIGINT or SIGTERM (Ctrl+C on Windows) every listener is unregistered
//! from the bridge before the process exits. A second signal exits at once.

use tracing::{error, info};

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod monitor;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the host until shutdown.
///
/// Exits the process with status 1 on any startup or runtime failure.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // read once; logging needs its settings before anything can be reported
    let (config, created) = match AppConfig::load_for(&args).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!(
                "❌ Failed to load configuration from {}: {e}",
                args.config_path.display()
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    if created {
        info!(
            "📝 Created default configuration file: {}",
            args.config_path.display()
        );
    } else {
        info!("🔧 Loaded configuration from: {}", args.config_path.display());
    }

    match Application::new(config) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{ConfigError, LoggingSettings, MonitorSettings};
