//! Logging infrastructure for Hunt HQ.
//!
//! This module provides structured logging using the tracing ecosystem.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Crates whose events pass the default filter.
const HUNT_CRATES: &[&str] = &["hunt_core", "hunt_api", "hunt_cli", "hunt_observability"];

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level.
    pub level: Level,
    /// Whether to use JSON format.
    pub json_format: bool,
    /// Whether to include span events.
    pub include_spans: bool,
    /// Whether to include file/line info.
    pub include_location: bool,
    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_spans: false,
            include_location: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Creates a development configuration with more verbose output.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json_format: false,
            include_spans: true,
            include_location: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            include_spans: false,
            include_location: false,
            include_target: true,
        }
    }

    /// Builds a configuration from a level name such as `"debug"`.
    ///
    /// Unknown names fall back to `info`.
    pub fn from_level_name(level: &str, json_format: bool) -> Self {
        Self {
            level: Level::from_str(level).unwrap_or(Level::INFO),
            json_format,
            ..Self::default()
        }
    }

    /// Filter directives used when `RUST_LOG` is not set.
    pub fn default_directives(&self) -> String {
        let mut directives: Vec<String> = HUNT_CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, self.level))
            .collect();
        directives.push("tower_http=info".to_string());
        directives.push("sqlx=warn".to_string());
        directives.join(",")
    }
}

/// Initializes the logging system with default configuration.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::default());
}

/// Initializes the logging system with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is a no-op.
pub fn init_logging_with_config(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let result = if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already set, keeping existing one");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.json_format);
        assert!(!config.include_location);
    }

    #[test]
    fn test_from_level_name() {
        assert_eq!(LoggingConfig::from_level_name("debug", false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_level_name("WARN", true).level, Level::WARN);
        assert_eq!(LoggingConfig::from_level_name("chatty", false).level, Level::INFO);
    }

    #[test]
    fn test_default_directives_cover_workspace_crates() {
        let directives = LoggingConfig::development().default_directives();
        assert!(directives.contains("hunt_core=DEBUG"));
        assert!(directives.contains("hunt_api=DEBUG"));
        assert!(directives.contains("sqlx=warn"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging();
        init_logging_with_config(LoggingConfig::production());
    }
}
