//! Serve command - starts the API server.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;

use hunt_api::{ApiServer, ApiServerConfig, AppState};
use hunt_core::db::{
    create_pool_with_options, create_user_repository, ensure_admin_user, run_migrations,
    seed::DEFAULT_ADMIN_EMAIL, PoolOptions,
};
use hunt_observability::metrics::install_prometheus_recorder;
use tracing::warn;

use crate::config::{redact_url_password, AppConfig};

/// Server settings after CLI flags are applied over the config file.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub enable_docs: bool,
}

impl ServeConfig {
    /// Takes file values, letting any flag that was given win.
    pub fn resolve(
        app_config: &AppConfig,
        host: Option<String>,
        port: Option<u16>,
        database_url: Option<String>,
        no_docs: bool,
    ) -> Self {
        Self {
            host: host.unwrap_or_else(|| app_config.server.host.clone()),
            port: port.unwrap_or(app_config.server.port),
            database_url: database_url.unwrap_or_else(|| app_config.database.url.clone()),
            enable_docs: app_config.server.enable_docs && !no_docs,
        }
    }

    fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid bind address")
    }
}

/// Runs the API server.
pub async fn run_server(config: ServeConfig, app_config: AppConfig) -> Result<()> {
    println!("{} Starting Hunt HQ API Server...", "[server]".cyan());

    let mut pool_options = PoolOptions::default();
    if let Some(max) = app_config.database.max_connections {
        pool_options = pool_options.with_max_connections(max);
    }

    println!("  {} Database: {}", "→".green(), redact_url_password(&config.database_url));
    let db_pool = create_pool_with_options(&config.database_url, pool_options)
        .await
        .context("Failed to create database connection pool")?;

    println!("  {} Running migrations...", "→".green());
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    println!("  {} Migrations complete", "✓".green());

    let seeded = ensure_admin_user(create_user_repository(&db_pool).as_ref())
        .await
        .context("Failed to seed admin user")?;
    if let Some(password) = seeded {
        println!();
        println!("{}", "Created default admin account".yellow().bold());
        println!("  {} {}", "Email:".cyan(), DEFAULT_ADMIN_EMAIL);
        println!("  {} {}", "Password:".cyan(), password);
        println!("  Store this password now; it is not shown again.");
    }

    let policy = app_config.rate_limit_policy();
    let mut state = AppState::new(db_pool)
        .with_rate_limit(policy)
        .with_secure_cookies(app_config.server.secure_cookies);

    match install_prometheus_recorder() {
        Ok(handle) => state = state.with_prometheus_handle(handle),
        Err(e) => warn!(error = %e, "Prometheus recorder not installed, /metrics disabled"),
    }

    let bind_address = config.bind_address()?;
    let server_config = ApiServerConfig {
        bind_address,
        enable_docs: config.enable_docs,
        cors_origins: app_config.server.cors_origins.clone(),
    };

    println!();
    println!("{}", "Hunt HQ API Server".bold());
    println!("{}", "═".repeat(40));
    println!("  {} http://{}", "Address:".cyan(), bind_address);
    println!(
        "  {} {} failed claims per {} min",
        "Rate limit:".cyan(),
        policy.max_failed_attempts,
        app_config.rate_limit.window_minutes
    );
    if config.enable_docs {
        println!(
            "  {} http://{}/api-docs/openapi.json",
            "OpenAPI:".cyan(),
            bind_address
        );
    }

    println!();
    println!("{}", "Endpoints:".bold());
    println!("  GET    /health                     - Health check");
    println!("  POST   /auth/login                 - Sign in");
    println!("  GET    /api/hunt-items             - List hunt items");
    println!("  POST   /api/hunt-items             - Create hunt item");
    println!("  PUT    /api/hunt-items/:id         - Update hunt item");
    println!("  DELETE /api/hunt-items/:id         - Delete hunt item");
    println!("  GET    /api/admin/claim-attempts   - List claim attempts");
    println!("  POST   /api/admin/claim-attempts   - Clear claim attempts");
    println!("  GET    /api/admin/audit-logs       - Audit trail");
    println!("  GET    /api/users/:id              - User history");
    println!("  POST   /api/claims                 - Claim a hunt item");
    println!("  GET    /metrics                    - Prometheus metrics");
    println!();
    println!("Press {} to stop", "Ctrl+C".yellow());
    println!();

    let server = ApiServer::new(state, server_config);
    server.run().await.context("Server error")?;

    println!();
    println!("{} Server stopped", "[server]".cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let mut app_config = AppConfig::default();
        app_config.server.port = 9000;
        app_config.database.url = "postgres://localhost/hunt".to_string();

        let config = ServeConfig::resolve(&app_config, None, Some(7000), None, false);
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database_url, "postgres://localhost/hunt");
        assert!(config.enable_docs);
        assert!(config.bind_address().is_ok());
    }

    #[test]
    fn test_no_docs_flag_disables_docs() {
        let config = ServeConfig::resolve(&AppConfig::default(), None, None, None, true);
        assert!(!config.enable_docs);
    }

    #[test]
    fn test_bad_host_is_rejected() {
        let config = ServeConfig::resolve(
            &AppConfig::default(),
            Some("not a host".to_string()),
            None,
            None,
            false,
        );
        assert!(config.bind_address().is_err());
    }
}
