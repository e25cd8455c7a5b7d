//! Admin audit log repository.

use super::{format_timestamp, parse_timestamp, DbError, DbPool};
use crate::audit::{AdminAction, AdminAuditRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for admin audit records.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Logs an audit record.
    async fn log(&self, record: &AdminAuditRecord) -> Result<(), DbError>;

    /// Gets the most recent records, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<AdminAuditRecord>, DbError>;

    /// Gets records that targeted a user, newest first.
    async fn by_target_user(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<AdminAuditRecord>, DbError>;
}

const AUDIT_COLUMNS: &str =
    "id, action, actor, target_user, resource_id, before_state, after_state, created_at";

/// SQLite implementation of AuditRepository.
pub struct SqliteAuditRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn log(&self, record: &AdminAuditRecord) -> Result<(), DbError> {
        let before = record
            .before
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let after = record
            .after
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO admin_audit_logs (id, action, actor, target_user, resource_id, before_state, after_state, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.action.as_str())
        .bind(&record.actor)
        .bind(&record.target_user)
        .bind(record.resource_id.map(|id| id.to_string()))
        .bind(&before)
        .bind(&after)
        .bind(format_timestamp(record.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AdminAuditRecord>, DbError> {
        let rows: Vec<SqliteAuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM admin_audit_logs ORDER BY created_at DESC, rowid DESC LIMIT ?"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn by_target_user(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<AdminAuditRecord>, DbError> {
        let rows: Vec<SqliteAuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM admin_audit_logs WHERE target_user = ? ORDER BY created_at DESC, rowid DESC LIMIT ?"
        ))
        .bind(email)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// PostgreSQL implementation of AuditRepository.
pub struct PgAuditRepository {
    pool: sqlx::PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn log(&self, record: &AdminAuditRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO admin_audit_logs (id, action, actor, target_user, resource_id, before_state, after_state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.action.as_str())
        .bind(&record.actor)
        .bind(&record.target_user)
        .bind(record.resource_id)
        .bind(&record.before)
        .bind(&record.after)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AdminAuditRecord>, DbError> {
        let rows: Vec<PgAuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM admin_audit_logs ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn by_target_user(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<AdminAuditRecord>, DbError> {
        let rows: Vec<PgAuditRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM admin_audit_logs WHERE target_user = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(email)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Factory function to create the appropriate repository based on pool type.
pub fn create_audit_repository(pool: &DbPool) -> Box<dyn AuditRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteAuditRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgAuditRepository::new(pool.clone())),
    }
}

fn parse_action(action: &str) -> Result<AdminAction, DbError> {
    action
        .parse()
        .map_err(|_| DbError::Serialization(format!("Invalid audit action: {}", action)))
}

#[derive(sqlx::FromRow)]
struct SqliteAuditRow {
    id: String,
    action: String,
    actor: String,
    target_user: Option<String>,
    resource_id: Option<String>,
    before_state: Option<String>,
    after_state: Option<String>,
    created_at: String,
}

impl TryFrom<SqliteAuditRow> for AdminAuditRecord {
    type Error = DbError;

    fn try_from(row: SqliteAuditRow) -> Result<Self, Self::Error> {
        Ok(AdminAuditRecord {
            id: Uuid::parse_str(&row.id).map_err(DbError::invalid_uuid)?,
            action: parse_action(&row.action)?,
            actor: row.actor,
            target_user: row.target_user,
            resource_id: row
                .resource_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(DbError::invalid_uuid)?,
            before: row
                .before_state
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            after: row
                .after_state
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            timestamp: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgAuditRow {
    id: Uuid,
    action: String,
    actor: String,
    target_user: Option<String>,
    resource_id: Option<Uuid>,
    before_state: Option<serde_json::Value>,
    after_state: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgAuditRow> for AdminAuditRecord {
    type Error = DbError;

    fn try_from(row: PgAuditRow) -> Result<Self, Self::Error> {
        Ok(AdminAuditRecord {
            id: row.id,
            action: parse_action(&row.action)?,
            actor: row.actor,
            target_user: row.target_user,
            resource_id: row.resource_id,
            before: row.before_state,
            after: row.after_state,
            timestamp: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_and_read_back() {
        let repo = create_audit_repository(&test_pool().await);
        let record = AdminAuditRecord::new(AdminAction::ClearClaimAttempts, "admin@localhost")
            .with_target_user("player@example.com")
            .with_change(
                Some(json!({"attempts": 4, "failedAttempts": 3})),
                Some(json!({"attempts": 1, "failedAttempts": 0})),
            );
        repo.log(&record).await.unwrap();

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].action, AdminAction::ClearClaimAttempts);
        assert_eq!(recent[0].before, record.before);
        assert_eq!(recent[0].after, record.after);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let repo = create_audit_repository(&test_pool().await);
        let now = Utc::now();
        for minutes in [30, 10, 20] {
            let record = AdminAuditRecord::new(AdminAction::CreateHuntItem, "admin@localhost")
                .with_resource(Uuid::new_v4())
                .at(now - Duration::minutes(minutes));
            repo.log(&record).await.unwrap();
        }

        let recent = repo.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].timestamp > recent[1].timestamp);
        assert!(recent[0].resource_id.is_some());
    }

    #[tokio::test]
    async fn test_by_target_user() {
        let repo = create_audit_repository(&test_pool().await);
        repo.log(
            &AdminAuditRecord::new(AdminAction::ClearClaimAttempts, "admin@localhost")
                .with_target_user("a@example.com"),
        )
        .await
        .unwrap();
        repo.log(
            &AdminAuditRecord::new(AdminAction::ClearClaimAttempts, "admin@localhost")
                .with_target_user("b@example.com"),
        )
        .await
        .unwrap();

        let records = repo.by_target_user("a@example.com", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target_user.as_deref(), Some("a@example.com"));
    }
}
