//! Command-line interface handling for the Keystone host.
//!
//! This module provides command-line argument parsing using the `clap` crate.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "keystone.toml";

/// Command line arguments parsed from user input.
///
/// Every option except the config path overrides the matching setting of
/// the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the health report interval, in seconds
    pub stats_interval: Option<u64>,
}

impl CliArgs {
    /// Parses the process arguments, exiting with a usage message on error.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses an explicit argument list; the first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }

    fn command() -> Command {
        Command::new("Keystone")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Shared notification bridge host for game server plugins")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value(DEFAULT_CONFIG_PATH),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("stats-interval")
                    .long("stats-interval")
                    .value_name("SECONDS")
                    .help("Seconds between bridge health reports")
                    .value_parser(clap::value_parser!(u64)),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            stats_interval: matches.get_one::<u64>("stats-interval").copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["keystone"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("keystone.toml"));
        assert_eq!(args.log_level, None);
        assert!(!args.json_logs);
        assert_eq!(args.stats_interval, None);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "keystone",
            "--config",
            "prod.toml",
            "-l",
            "debug",
            "--json-logs",
            "--stats-interval",
            "15",
        ])
        .unwrap();

        assert_eq!(
            args,
            CliArgs {
                config_path: PathBuf::from("prod.toml"),
                log_level: Some("debug".to_string()),
                json_logs: true,
                stats_interval: Some(15),
            }
        );
    }

    #[test]
    fn test_rejects_non_numeric_interval() {
        assert!(CliArgs::try_parse_from(["keystone", "--stats-interval", "soon"]).is_err());
    }
}
