//! Logging setup for the `metafactory` workspace.
//!
//! The library crates only emit `tracing` events. This crate owns the one
//! place where a subscriber gets installed, so benches, tests and binaries
//! all configure output the same way.
//!
//! # Example
//!
//! ```
//! use metafactory_log::{Level, info};
//!
//! metafactory_log::init(Level::Debug);
//!
//! let property = "field";
//! info!("resolving {}", property);
//! ```
//!
//! # Environment
//!
//! - `METAFACTORY_LOG`: filter directives (`debug`, `metafactory=trace`, ...).
//!   Takes precedence over `RUST_LOG`.
//! - `METAFACTORY_LOG_FORMAT`: `text` (default) or `json`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

pub use tracing::{debug, error, info, trace, warn};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "METAFACTORY_LOG";

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "METAFACTORY_LOG_FORMAT";

/// Log levels representing the severity/priority of log messages.
///
/// `Levels` are ordered from most severe (Error) to least severe (Trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Error level - critical failures and errors
    Error = 0,
    /// Warning level - potentially harmful situations
    Warn = 1,
    /// Info level - informational messages
    Info = 2,
    /// Debug level - resolution and binding decisions
    Debug = 3,
    /// Trace level - linkage details
    Trace = 4,
}

impl Level {
    /// Returns the string representation of this log level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// Parses a string into a Level.
    ///
    /// # Example
    ///
    /// ```
    /// use metafactory_log::Level;
    ///
    /// assert_eq!(Level::from_str("error"), Ok(Level::Error));
    /// assert_eq!(Level::from_str("INFO"), Ok(Level::Info));
    /// assert!(Level::from_str("invalid").is_err());
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_uppercase().as_str() {
            "ERROR" => Ok(Level::Error),
            "WARN" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }

    /// The `tracing` filter admitting this level and everything more severe.
    pub const fn as_filter(&self) -> LevelFilter {
        match self {
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

/// Subscriber output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything unrecognised is `Text`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    /// Reads the format from `METAFACTORY_LOG_FORMAT`.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or(LogFormat::Text)
    }
}

/// Installs a global subscriber admitting `level` and above.
///
/// Output goes to stderr so it never mixes with bench reports on stdout.
/// Returns `false` when another subscriber was already installed.
pub fn init(level: Level) -> bool {
    install(EnvFilter::default().add_directive(level.as_filter().into()), LogFormat::from_env())
}

/// Installs a subscriber configured from the environment.
///
/// Does nothing unless `METAFACTORY_LOG` or `RUST_LOG` is set, so runs that
/// don't ask for logs pay nothing. Returns whether this call installed it.
pub fn init_from_env() -> bool {
    let filter = if let Ok(directives) = std::env::var(LOG_ENV) {
        EnvFilter::builder().parse_lossy(directives)
    } else if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        EnvFilter::from_default_env()
    } else {
        return false;
    };

    install(filter, LogFormat::from_env())
}

fn install(filter: EnvFilter, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Text => builder.try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
        assert!(Level::Debug < Level::Trace);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!(Level::from_str("error"), Ok(Level::Error));
        assert_eq!(Level::from_str("WARN"), Ok(Level::Warn));
        assert_eq!(Level::from_str("Info"), Ok(Level::Info));
        assert_eq!(Level::from_str(" debug "), Ok(Level::Debug));
        assert_eq!(Level::from_str("trace"), Ok(Level::Trace));
        assert!(Level::from_str("invalid").is_err());
    }

    #[test]
    fn test_level_as_str() {
        assert_eq!(Level::Error.as_str(), "ERROR");
        assert_eq!(Level::Warn.as_str(), "WARN");
        assert_eq!(Level::Info.as_str(), "INFO");
        assert_eq!(Level::Debug.as_str(), "DEBUG");
        assert_eq!(Level::Trace.as_str(), "TRACE");
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(Level::Error.as_filter(), LevelFilter::ERROR);
        assert_eq!(Level::Trace.as_filter(), LevelFilter::TRACE);
        assert!(Level::Warn.as_filter() < Level::Debug.as_filter());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("tree"), LogFormat::Text);
    }

    #[test]
    fn test_init_is_idempotent() {
        // Only one global subscriber can exist per process
        assert!(init(Level::Info));
        assert!(!init(Level::Debug));
        assert!(!init_from_env());

        info!("subscriber installed");
        debug!("filtered unless debug is enabled");
    }
}
