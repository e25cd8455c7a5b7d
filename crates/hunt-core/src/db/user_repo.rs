//! User repository: accounts, claim attempts and claimed-item history.

use super::{format_timestamp, parse_timestamp, DbError, DbPool};
use crate::auth::{normalize_email, Role, User, UserFilter};
use crate::claim::{
    ClaimAttempt, ClaimAttemptFilter, HistoryEntry, UserClaimAttempt, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// SQLite caps bound parameters per statement; deletes are chunked below it.
const SQLITE_DELETE_CHUNK: usize = 500;

/// Repository trait for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a new user.
    async fn create(&self, user: &User) -> Result<User, DbError>;

    /// Gets a user by ID.
    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError>;

    /// Gets a user by email (case-insensitive).
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Lists users with optional filtering, oldest account first.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DbError>;

    /// Checks if any users exist (for initial setup).
    async fn any_exist(&self) -> Result<bool, DbError>;

    /// Returns the user's claim attempts in insertion order.
    async fn claim_attempts(&self, user_id: Uuid) -> Result<Vec<ClaimAttempt>, DbError>;

    /// Returns the user's claimed-item history in insertion order.
    async fn history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, DbError>;

    /// Appends a claim attempt.
    async fn append_claim_attempt(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
    ) -> Result<(), DbError>;

    /// Appends a successful attempt and its history entry atomically.
    async fn record_claim(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
        entry: &HistoryEntry,
    ) -> Result<(), DbError>;

    /// Removes the given attempts from the user's list.
    ///
    /// Ids that are already gone are ignored. Returns the number removed.
    async fn remove_claim_attempts(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, DbError>;

    /// Lists attempts across users, flattened in (user, insertion) order.
    async fn list_claim_attempts(
        &self,
        filter: &ClaimAttemptFilter,
    ) -> Result<Vec<UserClaimAttempt>, DbError>;

    /// Loads a user together with their attempts and history.
    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, DbError> {
        let Some(user) = self.get(id).await? else {
            return Ok(None);
        };
        let claim_attempts = self.claim_attempts(id).await?;
        let history = self.history(id).await?;
        Ok(Some(UserProfile {
            user,
            claim_attempts,
            history,
        }))
    }
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role, enabled, created_at, updated_at";

/// SQLite implementation of UserRepository.
pub struct SqliteUserRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User) -> Result<User, DbError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(normalize_email(&user.email))
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.enabled)
        .bind(format_timestamp(user.created_at))
        .bind(format_timestamp(user.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(user.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let row: Option<SqliteUserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let row: Option<SqliteUserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        let mut query = format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(role) = &filter.role {
            query.push_str(" AND role = ?");
            params.push(role.as_str().to_string());
        }
        if let Some(email) = &filter.email {
            query.push_str(" AND email = ?");
            params.push(normalize_email(email));
        }
        query.push_str(" ORDER BY created_at ASC, id ASC");

        let mut sqlx_query = sqlx::query_as::<_, SqliteUserRow>(&query);
        for param in params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn claim_attempts(&self, user_id: Uuid) -> Result<Vec<ClaimAttempt>, DbError> {
        let rows: Vec<SqliteAttemptRow> = sqlx::query_as(
            r#"
            SELECT id, identifier, success, item_id, timestamp
            FROM claim_attempts
            WHERE user_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, DbError> {
        let rows: Vec<SqliteHistoryRow> = sqlx::query_as(
            r#"
            SELECT item_id, item_name, points, claimed_at
            FROM claim_history
            WHERE user_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn append_claim_attempt(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO claim_attempts (id, user_id, identifier, success, item_id, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(user_id.to_string())
        .bind(&attempt.identifier)
        .bind(attempt.success)
        .bind(attempt.item_id.map(|id| id.to_string()))
        .bind(format_timestamp(attempt.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_claim(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
        entry: &HistoryEntry,
    ) -> Result<(), DbError> {
        let user_id = user_id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO claim_attempts (id, user_id, identifier, success, item_id, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(&user_id)
        .bind(&attempt.identifier)
        .bind(attempt.success)
        .bind(attempt.item_id.map(|id| id.to_string()))
        .bind(format_timestamp(attempt.timestamp))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO claim_history (user_id, item_id, item_name, points, claimed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(entry.item_id.map(|id| id.to_string()))
        .bind(&entry.item_name)
        .bind(entry.points)
        .bind(format_timestamp(entry.claimed_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_claim_attempts(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let user_id = user_id.to_string();
        let mut removed = 0;
        let mut tx = self.pool.begin().await?;

        for chunk in ids.chunks(SQLITE_DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!(
                "DELETE FROM claim_attempts WHERE user_id = ? AND id IN ({})",
                placeholders
            );

            let mut sqlx_query = sqlx::query(&query).bind(&user_id);
            for id in chunk {
                sqlx_query = sqlx_query.bind(id.to_string());
            }
            removed += sqlx_query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn list_claim_attempts(
        &self,
        filter: &ClaimAttemptFilter,
    ) -> Result<Vec<UserClaimAttempt>, DbError> {
        let mut query = String::from(
            r#"
            SELECT u.id AS user_id, u.email AS user_email, u.name AS user_name,
                   ca.id, ca.identifier, ca.success, ca.item_id, ca.timestamp
            FROM claim_attempts ca
            JOIN users u ON u.id = ca.user_id
            WHERE 1=1
            "#,
        );

        if filter.email.is_some() {
            query.push_str(" AND u.email = ?");
        }
        if filter.failed_only {
            query.push_str(" AND ca.success = 0");
        }
        query.push_str(" ORDER BY u.created_at ASC, u.id ASC, ca.seq ASC");

        let mut sqlx_query = sqlx::query_as::<_, SqliteUserAttemptRow>(&query);
        if let Some(email) = &filter.email {
            sqlx_query = sqlx_query.bind(normalize_email(email));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: sqlx::PgPool,
}

impl PgUserRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<User, DbError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(normalize_email(&user.email))
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.enabled)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let row: Option<PgUserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let row: Option<PgUserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        let mut conditions = vec!["1=1".to_string()];
        let mut param_idx = 1;

        if filter.role.is_some() {
            conditions.push(format!("role = ${}", param_idx));
            param_idx += 1;
        }
        if filter.email.is_some() {
            conditions.push(format!("email = ${}", param_idx));
        }

        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} ORDER BY created_at ASC, id ASC",
            conditions.join(" AND ")
        );

        let mut sqlx_query = sqlx::query_as::<_, PgUserRow>(&query);
        if let Some(role) = &filter.role {
            sqlx_query = sqlx_query.bind(role.as_str());
        }
        if let Some(email) = &filter.email {
            sqlx_query = sqlx_query.bind(normalize_email(email));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn claim_attempts(&self, user_id: Uuid) -> Result<Vec<ClaimAttempt>, DbError> {
        let rows: Vec<PgAttemptRow> = sqlx::query_as(
            r#"
            SELECT id, identifier, success, item_id, timestamp
            FROM claim_attempts
            WHERE user_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, DbError> {
        let rows: Vec<PgHistoryRow> = sqlx::query_as(
            r#"
            SELECT item_id, item_name, points, claimed_at
            FROM claim_history
            WHERE user_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn append_claim_attempt(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO claim_attempts (id, user_id, identifier, success, item_id, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attempt.id)
        .bind(user_id)
        .bind(&attempt.identifier)
        .bind(attempt.success)
        .bind(attempt.item_id)
        .bind(attempt.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_claim(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
        entry: &HistoryEntry,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO claim_attempts (id, user_id, identifier, success, item_id, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attempt.id)
        .bind(user_id)
        .bind(&attempt.identifier)
        .bind(attempt.success)
        .bind(attempt.item_id)
        .bind(attempt.timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO claim_history (user_id, item_id, item_name, points, claimed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(entry.item_id)
        .bind(&entry.item_name)
        .bind(entry.points)
        .bind(entry.claimed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_claim_attempts(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM claim_attempts WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_claim_attempts(
        &self,
        filter: &ClaimAttemptFilter,
    ) -> Result<Vec<UserClaimAttempt>, DbError> {
        let mut query = String::from(
            r#"
            SELECT u.id AS user_id, u.email AS user_email, u.name AS user_name,
                   ca.id, ca.identifier, ca.success, ca.item_id, ca.timestamp
            FROM claim_attempts ca
            JOIN users u ON u.id = ca.user_id
            WHERE 1=1
            "#,
        );

        if filter.email.is_some() {
            query.push_str(" AND u.email = $1");
        }
        if filter.failed_only {
            query.push_str(" AND ca.success = FALSE");
        }
        query.push_str(" ORDER BY u.created_at ASC, u.id ASC, ca.seq ASC");

        let mut sqlx_query = sqlx::query_as::<_, PgUserAttemptRow>(&query);
        if let Some(email) = &filter.email {
            sqlx_query = sqlx_query.bind(normalize_email(email));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Factory function to create the appropriate repository based on pool type.
pub fn create_user_repository(pool: &DbPool) -> Box<dyn UserRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteUserRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgUserRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteUserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    enabled: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteUserRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteUserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| DbError::Serialization(format!("Invalid role: {}", row.role)))?;

        Ok(User {
            id: Uuid::parse_str(&row.id).map_err(DbError::invalid_uuid)?,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role,
            enabled: row.enabled,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SqliteAttemptRow {
    id: String,
    identifier: String,
    success: bool,
    item_id: Option<String>,
    timestamp: String,
}

impl TryFrom<SqliteAttemptRow> for ClaimAttempt {
    type Error = DbError;

    fn try_from(row: SqliteAttemptRow) -> Result<Self, Self::Error> {
        Ok(ClaimAttempt {
            id: Uuid::parse_str(&row.id).map_err(DbError::invalid_uuid)?,
            identifier: row.identifier,
            success: row.success,
            timestamp: parse_timestamp(&row.timestamp)?,
            item_id: row
                .item_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(DbError::invalid_uuid)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SqliteUserAttemptRow {
    user_id: String,
    user_email: String,
    user_name: String,
    #[sqlx(flatten)]
    attempt: SqliteAttemptRow,
}

impl TryFrom<SqliteUserAttemptRow> for UserClaimAttempt {
    type Error = DbError;

    fn try_from(row: SqliteUserAttemptRow) -> Result<Self, Self::Error> {
        Ok(UserClaimAttempt {
            user_id: Uuid::parse_str(&row.user_id).map_err(DbError::invalid_uuid)?,
            user_email: row.user_email,
            user_name: row.user_name,
            attempt: row.attempt.try_into()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SqliteHistoryRow {
    item_id: Option<String>,
    item_name: String,
    points: i64,
    claimed_at: String,
}

impl TryFrom<SqliteHistoryRow> for HistoryEntry {
    type Error = DbError;

    fn try_from(row: SqliteHistoryRow) -> Result<Self, Self::Error> {
        Ok(HistoryEntry {
            item_id: row
                .item_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(DbError::invalid_uuid)?,
            item_name: row.item_name,
            points: row.points,
            claimed_at: parse_timestamp(&row.claimed_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgUserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PgUserRow> for User {
    type Error = DbError;

    fn try_from(row: PgUserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| DbError::Serialization(format!("Invalid role: {}", row.role)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgAttemptRow {
    id: Uuid,
    identifier: String,
    success: bool,
    item_id: Option<Uuid>,
    timestamp: DateTime<Utc>,
}

impl From<PgAttemptRow> for ClaimAttempt {
    fn from(row: PgAttemptRow) -> Self {
        ClaimAttempt {
            id: row.id,
            identifier: row.identifier,
            success: row.success,
            timestamp: row.timestamp,
            item_id: row.item_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PgUserAttemptRow {
    user_id: Uuid,
    user_email: String,
    user_name: String,
    #[sqlx(flatten)]
    attempt: PgAttemptRow,
}

impl From<PgUserAttemptRow> for UserClaimAttempt {
    fn from(row: PgUserAttemptRow) -> Self {
        UserClaimAttempt {
            user_id: row.user_id,
            user_email: row.user_email,
            user_name: row.user_name,
            attempt: row.attempt.into(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PgHistoryRow {
    item_id: Option<Uuid>,
    item_name: String,
    points: i64,
    claimed_at: DateTime<Utc>,
}

impl From<PgHistoryRow> for HistoryEntry {
    fn from(row: PgHistoryRow) -> Self {
        HistoryEntry {
            item_id: row.item_id,
            item_name: row.item_name,
            points: row.points,
            claimed_at: row.claimed_at,
        }
    }
}
