//! Database connection pool management.

use super::DbError;
use sqlx::{Pool, Postgres, Sqlite};
use std::time::Duration;
use tracing::info;

/// Unified database pool that can work with SQLite or PostgreSQL.
#[derive(Clone)]
pub enum DbPool {
    /// SQLite connection pool (for development/testing).
    Sqlite(Pool<Sqlite>),
    /// PostgreSQL connection pool (for production).
    Postgres(Pool<Postgres>),
}

/// Options for creating a database connection pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Maximum time to wait for a connection.
    pub acquire_timeout: Duration,
    /// Maximum lifetime of a connection.
    pub max_lifetime: Option<Duration>,
    /// Idle timeout for connections.
    pub idle_timeout: Option<Duration>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", 1),
            acquire_timeout: Duration::from_secs(env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)),
            max_lifetime: Some(Duration::from_secs(1800)),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl PoolOptions {
    /// Overrides the maximum number of connections.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = self.min_connections.min(max_connections);
        self
    }
}

/// Returns the backend name for a database URL, or `None` if the scheme is unsupported.
pub fn backend_for_url(database_url: &str) -> Option<&'static str> {
    if database_url.starts_with("sqlite:") {
        Some("sqlite")
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
    {
        Some("postgres")
    } else {
        None
    }
}

/// Creates a database connection pool from a database URL.
///
/// The URL scheme determines the database type:
/// - `sqlite://` or `sqlite:` for SQLite
/// - `postgres://` or `postgresql://` for PostgreSQL
pub async fn create_pool(database_url: &str) -> Result<DbPool, DbError> {
    create_pool_with_options(database_url, PoolOptions::default()).await
}

/// Creates a database connection pool with custom options.
pub async fn create_pool_with_options(
    database_url: &str,
    options: PoolOptions,
) -> Result<DbPool, DbError> {
    match backend_for_url(database_url) {
        Some("sqlite") => {
            info!(max_connections = options.max_connections, "Creating SQLite connection pool");
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(options.max_connections)
                .min_connections(options.min_connections)
                .acquire_timeout(options.acquire_timeout)
                .max_lifetime(options.max_lifetime)
                .idle_timeout(options.idle_timeout)
                .connect(database_url)
                .await?;
            Ok(DbPool::Sqlite(pool))
        }
        Some(_) => {
            info!(max_connections = options.max_connections, "Creating PostgreSQL connection pool");
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(options.max_connections)
                .min_connections(options.min_connections)
                .acquire_timeout(options.acquire_timeout)
                .max_lifetime(options.max_lifetime)
                .idle_timeout(options.idle_timeout)
                .connect(database_url)
                .await?;
            Ok(DbPool::Postgres(pool))
        }
        None => Err(DbError::Configuration(format!(
            "Unsupported database URL scheme. Expected sqlite:// or postgres://, got: {}",
            database_url.split(':').next().unwrap_or("unknown")
        ))),
    }
}

impl DbPool {
    /// Returns the database type as a string.
    pub fn db_type(&self) -> &'static str {
        match self {
            DbPool::Sqlite(_) => "sqlite",
            DbPool::Postgres(_) => "postgres",
        }
    }

    /// Checks if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        match self {
            DbPool::Sqlite(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
            DbPool::Postgres(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
        }
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::Sqlite(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
        }
    }

    /// Returns the number of open connections.
    pub fn pool_size(&self) -> u32 {
        match self {
            DbPool::Sqlite(pool) => pool.size(),
            DbPool::Postgres(pool) => pool.size(),
        }
    }

    /// Returns number of idle connections.
    pub fn idle_connections(&self) -> usize {
        match self {
            DbPool::Sqlite(pool) => pool.num_idle(),
            DbPool::Postgres(pool) => pool.num_idle(),
        }
    }
}
