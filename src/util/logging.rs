//! Structured logging setup
//!
//! Logs go to stderr so rendered output and `--help` text on stdout stay clean.
//! Configuration comes from CLI flags first, then the environment:
//!
//! - `REFFINDER_LOG_LEVEL` - trace, debug, info, warn, error
//! - `REFFINDER_LOG_JSON` - `true` for one JSON object per event
//! - `RUST_LOG` - standard filter directives, replacing the crate default
//!
//! ```no_run
//! use reference_finder::util::logging::{self, LoggingConfig};
//!
//! logging::init_logging(LoggingConfig::from_env());
//! tracing::info!(repo = "orders", "Cloning repository");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "REFFINDER_LOG_LEVEL";
pub const LOG_JSON_ENV: &str = "REFFINDER_LOG_JSON";

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate's events
    pub level: Level,

    pub use_json: bool,

    /// Include the module target (e.g. reference_finder::scan)
    pub include_target: bool,

    /// Include file and line number
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Level from `REFFINDER_LOG_LEVEL` and format from `REFFINDER_LOG_JSON`
    pub fn from_env() -> Self {
        let level = env::var(LOG_LEVEL_ENV)
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);

        let use_json = env::var(LOG_JSON_ENV)
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }

    /// Applies CLI flags on top of the environment: an explicit level wins,
    /// then `verbose` (debug), then `quiet` (error)
    pub fn from_args(log_level: Option<&str>, verbose: bool, quiet: bool) -> Self {
        let mut config = Self::from_env();
        if let Some(level) = log_level {
            config.level = parse_level(level);
        } else if verbose {
            config.level = Level::DEBUG;
        } else if quiet {
            config.level = Level::ERROR;
        }
        config
    }
}

/// Parses a level name case-insensitively, falling back to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(format!("warn,reference_finder={}", level))
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}
