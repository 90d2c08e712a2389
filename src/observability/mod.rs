//! Observability
//!
//! Structured logging through `tracing`. `init_logging` installs the global
//! subscriber once at boot; the JSON format emits one line per event.
//! `RUST_LOG` takes precedence over the configured level.

mod events;

pub use events::Event;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive (default: "info")
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format (default: json)
    #[serde(default = "default_format")]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> LogFormat {
    LogFormat::Json
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

/// Logging could not be set up. Never fatal: the server runs without logs.
#[derive(Debug, Error)]
#[error("DIT_OBSERVABILITY_FAILED: {0}")]
pub struct ObservabilityError(String);

pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Installs the global subscriber
pub fn init_logging(config: &LogConfig) -> ObservabilityResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ObservabilityError(format!("invalid log level '{}': {}", config.level, e)))?;

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .json()
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init(),
    };

    installed.map_err(|e| ObservabilityError(format!("failed to install subscriber: {}", e)))
}

/// Logs a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Logs a lifecycle event with extra fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let fields: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    let fields = fields.join(" ");
    if event.is_fatal() {
        tracing::error!(event = event.as_str(), %fields);
    } else {
        tracing::info!(event = event.as_str(), %fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_format_from_json() {
        let config: LogConfig = serde_json::from_str(r#"{ "format": "compact" }"#).unwrap();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_log_event_without_subscriber() {
        log_event(Event::BootStart);
        log_event_with_fields(Event::SchemasLoaded, &[("count", "36")]);
    }
}
