//! Subscriber setup for applications embedding the attempt services.
//!
//! The services only emit `tracing` events; nothing is printed unless the
//! host installs a subscriber, typically once at startup:
//!
//! ```no_run
//! use services::logging::{init, LogFormat};
//!
//! init(LogFormat::Text, "info").ok();
//! ```

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const FORMAT_VAR: &str = "LINGO_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines on stderr.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoggingError {
    #[error("unknown log format {0:?}, expected text or json")]
    UnknownFormat(String),
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

/// Install the global subscriber. `RUST_LOG` overrides `default_level`.
///
/// # Errors
///
/// Returns `LoggingError::Filter` for an unparsable level and
/// `LoggingError::AlreadyInitialized` when called twice.
pub fn init(format: LogFormat, default_level: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level).map_err(|e| LoggingError::Filter(e.to_string()))?,
    };

    let installed = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .flatten_event(true)
            .with_current_span(true)
            .try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInitialized)
}

/// `init` with the format taken from `LINGO_LOG_FORMAT` (text when unset).
///
/// # Errors
///
/// Same as [`init`], plus `LoggingError::UnknownFormat`.
pub fn init_from_env(default_level: &str) -> Result<(), LoggingError> {
    let format = match std::env::var(FORMAT_VAR) {
        Ok(raw) => raw.parse()?,
        Err(_) => LogFormat::default(),
    };
    init(format, default_level)
}
