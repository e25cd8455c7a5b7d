//! Configuration validation for Hunt HQ.
//!
//! Runs before the server starts so a bad window or database URL fails fast
//! instead of surfacing on the first claim.

use crate::config::AppConfig;
use colored::Colorize;
use hunt_core::db::backend_for_url;
use hunt_core::db::seed::ADMIN_PASSWORD_ENV;

/// Windows longer than this are almost certainly a unit mistake.
const MAX_SENSIBLE_WINDOW_MINUTES: i64 = 24 * 60;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Critical errors that prevent startup.
    pub errors: Vec<String>,
    /// Warnings that should be addressed but don't prevent startup.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Prints the validation result to the console.
    pub fn print(&self) {
        if !self.warnings.is_empty() {
            println!();
            println!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            println!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates application configuration before startup.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the application configuration.
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_rate_limit(config, &mut result);
        Self::validate_database(config, &mut result);
        Self::validate_server(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_admin_seed(&mut result);

        result
    }

    fn validate_rate_limit(config: &AppConfig, result: &mut ValidationResult) {
        let rate_limit = &config.rate_limit;

        if rate_limit.window_minutes <= 0 {
            result.add_error(format!(
                "rate_limit.window_minutes must be positive, got {}",
                rate_limit.window_minutes
            ));
        } else if rate_limit.window_minutes > MAX_SENSIBLE_WINDOW_MINUTES {
            result.add_warning(format!(
                "rate_limit.window_minutes is {} (more than a day). \
                 Players who fail a few codes will stay blocked for a long time.",
                rate_limit.window_minutes
            ));
        }

        if rate_limit.max_failed_attempts == 0 {
            result.add_error(
                "rate_limit.max_failed_attempts must be at least 1. \
                 A threshold of 0 blocks every claim.",
            );
        } else if rate_limit.max_failed_attempts < 3 {
            result.add_warning(format!(
                "rate_limit.max_failed_attempts is {}. A single typo will lock players out.",
                rate_limit.max_failed_attempts
            ));
        }
    }

    fn validate_database(config: &AppConfig, result: &mut ValidationResult) {
        let url = &config.database.url;

        if backend_for_url(url).is_none() {
            result.add_error(format!(
                "Invalid database URL '{}'. Must start with sqlite:// or postgres://",
                config.redacted_database_url()
            ));
        }

        if url.contains(":memory:") {
            result.add_warning(
                "Using an in-memory SQLite database. All hunt data is lost on restart.",
            );
        }

        if config.database.max_connections == Some(0) {
            result.add_error("database.max_connections must be at least 1");
        }
    }

    fn validate_server(config: &AppConfig, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_warning("server.port is 0. The OS will pick a random port.");
        }

        let plain_http_origin = config
            .server
            .cors_origins
            .iter()
            .any(|origin| origin.starts_with("http://"));
        if config.server.secure_cookies && plain_http_origin {
            result.add_warning(
                "server.secure_cookies is set but some CORS origins use plain http. \
                 Browsers will not send the session cookie from those origins.",
            );
        }
    }

    fn validate_logging(config: &AppConfig, result: &mut ValidationResult) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            result.add_warning(format!(
                "Unknown logging.level '{}'. Falling back to info.",
                config.logging.level
            ));
        }
    }

    fn validate_admin_seed(result: &mut ValidationResult) {
        if std::env::var(ADMIN_PASSWORD_ENV).map_or(true, |p| p.is_empty()) {
            result.add_warning(format!(
                "{} not set. If no users exist yet, a random admin password \
                 is generated and printed once at startup.",
                ADMIN_PASSWORD_ENV
            ));
        }
    }
}
