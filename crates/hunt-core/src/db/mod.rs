//! Database layer for Hunt HQ.
//!
//! Persistence for users, claim attempts, hunt items and the admin audit
//! trail using SQLx with support for both SQLite (development) and
//! PostgreSQL (production).

mod error;
pub mod mocks;
mod pool;
mod schema;

pub mod audit_repo;
pub mod hunt_item_repo;
pub mod seed;
pub mod user_repo;

pub use error::DbError;
pub use pool::{backend_for_url, create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use schema::run_migrations;

// Re-export repository traits
pub use audit_repo::AuditRepository;
pub use hunt_item_repo::HuntItemRepository;
pub use user_repo::UserRepository;

// Re-export factory functions
pub use audit_repo::create_audit_repository;
pub use hunt_item_repo::create_hunt_item_repository;
pub use user_repo::create_user_repository;

pub use seed::{ensure_admin_user, SeedError};

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp for SQLite TEXT columns.
///
/// Fixed precision with a `Z` suffix keeps the stored strings ordered
/// lexicographically in time.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp stored by [`format_timestamp`].
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(DbError::invalid_timestamp)
}

/// Creates a migrated, isolated in-memory SQLite pool.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let db_url = format!(
        "sqlite:file:test_core_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4()
    );
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .expect("Failed to create test pool");
    let pool = DbPool::Sqlite(pool);
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_timestamp_round_trip_keeps_micros() {
        let ts = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(ts)).unwrap();
        assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());
    }

    #[test]
    fn test_formatted_timestamps_sort_chronologically() {
        let base = Utc::now();
        let earlier = format_timestamp(base - Duration::milliseconds(1500));
        let later = format_timestamp(base);
        assert!(earlier < later);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DbError::Serialization(_))
        ));
    }
}
