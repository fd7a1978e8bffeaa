//! Configuration module for tdedupe.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::fs;
use std::time::Duration;

use anyhow::{Result, bail};
use itertools::Itertools;
use serde::Deserialize;

use torrent_dedupe::dedupe::{DEFAULT_MIN_MATCH_RATIO, DEFAULT_SIZE_TOLERANCE, RegexMarkerExtractor, Thresholds};

use crate::Args;

/// Default Transmission RPC host.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Default Transmission RPC port.
const DEFAULT_PORT: u16 = 9091;

/// Default number of attempts when fetching the torrent list.
const DEFAULT_RETRIES: u32 = 3;

/// Default delay between torrent list attempts in seconds.
const DEFAULT_RETRY_DELAY_SECONDS: u64 = 5;

/// User configuration from the config file.
#[derive(Debug, Default, Deserialize)]
pub struct DedupeConfig {
    /// Transmission RPC host.
    #[serde(default)]
    host: Option<String>,
    /// Transmission RPC port.
    #[serde(default)]
    port: Option<u16>,
    /// Connect using HTTPS.
    #[serde(default)]
    https: bool,
    /// Transmission RPC username.
    #[serde(default)]
    username: Option<String>,
    /// Transmission RPC password.
    #[serde(default)]
    password: Option<String>,
    /// Torrent name suffixes to filter by.
    #[serde(default)]
    suffixes: Vec<String>,
    /// Size difference in bytes that still counts as the same size.
    #[serde(default)]
    size_tolerance: Option<u64>,
    /// Fraction of episode files that must be found in the collection.
    #[serde(default)]
    min_match_ratio: Option<f64>,
    /// Extra episode marker regex patterns.
    #[serde(default)]
    marker_patterns: Vec<String>,
    /// Number of attempts when fetching the torrent list.
    #[serde(default)]
    retries: Option<u32>,
    /// Delay between torrent list attempts in seconds.
    #[serde(default)]
    retry_delay: Option<u64>,
    /// Enable dry-run mode by default.
    #[serde(default)]
    dryrun: bool,
    /// Skip confirmation prompts by default.
    #[serde(default)]
    yes: bool,
    /// Enable verbose output by default.
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    tdedupe: DedupeConfig,
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    /// Transmission RPC host.
    pub host: String,
    /// Transmission RPC port.
    pub port: u16,
    /// Connect using HTTPS.
    pub https: bool,
    /// Transmission RPC username.
    pub username: String,
    /// Transmission RPC password.
    pub password: String,
    /// Torrent name suffixes to filter by. Empty means no filtering.
    pub suffixes: Vec<String>,
    /// Classifier thresholds.
    pub thresholds: Thresholds,
    /// Extra marker patterns as given, for printing.
    pub marker_patterns: Vec<String>,
    /// Compiled episode marker extractor.
    pub markers: RegexMarkerExtractor,
    /// Number of attempts when fetching the torrent list.
    pub retries: u32,
    /// Base delay between torrent list attempts.
    pub retry_delay: Duration,
    /// Dry-run mode (don't actually pause torrents).
    pub dryrun: bool,
    /// Skip confirmation prompts.
    pub yes: bool,
    /// Verbose output.
    pub verbose: bool,
}

impl DedupeConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> Result<Self> {
        let Some(path) = torrent_dedupe::config::CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.tdedupe)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed,
    /// or if any setting is invalid.
    pub fn from_args(args: Args) -> Result<Self> {
        let user_config = DedupeConfig::get_user_config()?;
        Self::try_from_args(args, user_config)
    }

    /// Combine command line args with the user config, with args taking priority.
    ///
    /// # Errors
    /// Returns an error if the match ratio is out of range or a marker pattern is invalid.
    pub fn try_from_args(args: Args, user_config: DedupeConfig) -> Result<Self> {
        let host = args
            .host
            .or(user_config.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = args.port.or(user_config.port).unwrap_or(DEFAULT_PORT);

        let username = args.username.or(user_config.username).unwrap_or_default();

        let password = args.password.or(user_config.password).unwrap_or_default();

        // CLI suffixes replace config suffixes
        let suffixes = if args.suffixes.is_empty() {
            user_config.suffixes
        } else {
            args.suffixes
        };
        let suffixes: Vec<String> = suffixes
            .into_iter()
            .map(|suffix| suffix.trim().to_string())
            .filter(|suffix| !suffix.is_empty())
            .unique()
            .collect();

        let size_tolerance = args
            .size_tolerance
            .or(user_config.size_tolerance)
            .unwrap_or(DEFAULT_SIZE_TOLERANCE);

        let min_match_ratio = args
            .min_match_ratio
            .or(user_config.min_match_ratio)
            .unwrap_or(DEFAULT_MIN_MATCH_RATIO);

        if !(0.0..=1.0).contains(&min_match_ratio) {
            bail!("Match ratio must be between 0 and 1, got {min_match_ratio}");
        }

        // Combine patterns from config and CLI
        let marker_patterns: Vec<String> = user_config
            .marker_patterns
            .into_iter()
            .chain(args.marker_patterns)
            .unique()
            .collect();

        let markers = RegexMarkerExtractor::with_patterns(&marker_patterns)?;

        let retries = args
            .retries
            .or(user_config.retries)
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let retry_delay = Duration::from_secs(user_config.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY_SECONDS));

        Ok(Self {
            host,
            port,
            https: args.https || user_config.https,
            username,
            password,
            suffixes,
            thresholds: Thresholds {
                size_tolerance,
                min_match_ratio,
            },
            marker_patterns,
            markers,
            retries,
            retry_delay,
            dryrun: args.dryrun || user_config.dryrun,
            yes: args.yes || user_config.yes,
            verbose: args.verbose || user_config.verbose,
        })
    }

    /// Check if RPC credentials are provided.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }

    /// Password hidden for printing.
    #[must_use]
    pub fn masked_password(&self) -> &'static str {
        if self.password.is_empty() { "" } else { "******" }
    }
}


#[cfg(test)]
mod config_from_args_tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("test").chain(args.iter().copied())).expect("should parse")
    }

    #[test]
    fn uses_defaults_without_args_or_config() {
        let config = Config::try_from_args(parse(&[]), DedupeConfig::default()).expect("should create config");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9091);
        assert!(!config.https);
        assert!(!config.has_credentials());
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.masked_password(), "");
    }

    #[test]
    fn args_take_priority_over_user_config() {
        let user_config = DedupeConfig::from_toml_str(
            r#"
[tdedupe]
host = "nas.local"
port = 9092
username = "config-user"
password = "config-pass"
suffixes = ["HHWEB"]
size_tolerance = 2048
"#,
        )
        .expect("should parse config");
        let config = Config::try_from_args(
            parse(&["-H", "seedbox", "-u", "cli-user", "-x", "ADWeb", "-t", "0"]),
            user_config,
        )
        .expect("should create config");

        assert_eq!(config.host, "seedbox");
        assert_eq!(config.port, 9092);
        assert_eq!(config.username, "cli-user");
        assert_eq!(config.password, "config-pass");
        assert_eq!(config.masked_password(), "******");
        assert_eq!(config.suffixes, vec!["ADWeb"]);
        assert_eq!(config.thresholds.size_tolerance, 0);
    }

    #[test]
    fn suffixes_are_trimmed_and_empty_ones_dropped() {
        let config =
            Config::try_from_args(parse(&["-x", " ADWeb ,,HHWEB,ADWeb"]), DedupeConfig::default()).expect("should create config");
        assert_eq!(config.suffixes, vec!["ADWeb", "HHWEB"]);
    }

    #[test]
    fn rejects_match_ratio_out_of_range() {
        assert!(Config::try_from_args(parse(&["-m", "1.5"]), DedupeConfig::default()).is_err());
        assert!(Config::try_from_args(parse(&["--match-ratio=-0.1"]), DedupeConfig::default()).is_err());
    }

    #[test]
    fn rejects_invalid_marker_pattern() {
        assert!(Config::try_from_args(parse(&["-g", "[invalid(regex"]), DedupeConfig::default()).is_err());
    }

    #[test]
    fn combines_marker_patterns_from_config_and_args() {
        let user_config = DedupeConfig::from_toml_str("[tdedupe]\nmarker_patterns = ['EP\\d+']\n").expect("should parse");
        let config = Config::try_from_args(parse(&["-g", r"\d+x\d+", "-g", r"EP\d+"]), user_config)
            .expect("should create config");
        assert_eq!(config.marker_patterns, vec![r"EP\d+", r"\d+x\d+"]);
    }

    #[test]
    fn retries_are_at_least_one() {
        let config = Config::try_from_args(parse(&["-r", "0"]), DedupeConfig::default()).expect("should create config");
        assert_eq!(config.retries, 1);
    }

    #[test]
    fn boolean_flags_merge_with_config() {
        let user_config = DedupeConfig::from_toml_str("[tdedupe]\ndryrun = true\n").expect("should parse");
        let config = Config::try_from_args(parse(&["-y"]), user_config).expect("should create config");
        assert!(config.dryrun);
        assert!(config.yes);
        assert!(!config.verbose);
    }
}
