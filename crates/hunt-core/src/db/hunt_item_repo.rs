//! Hunt item repository for database operations.

use super::{format_timestamp, parse_timestamp, DbError, DbPool};
use crate::hunt_item::{HuntItem, HuntItemUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for hunt item persistence.
#[async_trait]
pub trait HuntItemRepository: Send + Sync {
    /// Creates a new hunt item.
    ///
    /// Fails with [`DbError::Constraint`] if the identifier is already taken.
    async fn create(&self, item: &HuntItem) -> Result<HuntItem, DbError>;

    /// Gets a hunt item by ID.
    async fn get(&self, id: Uuid) -> Result<Option<HuntItem>, DbError>;

    /// Gets a hunt item by its claim identifier.
    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<HuntItem>, DbError>;

    /// Lists all hunt items, most recently created first.
    async fn list(&self) -> Result<Vec<HuntItem>, DbError>;

    /// Applies a partial update and returns the updated item.
    async fn update(&self, id: Uuid, update: &HuntItemUpdate) -> Result<HuntItem, DbError>;

    /// Deletes a hunt item. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

fn item_not_found(id: Uuid) -> DbError {
    DbError::NotFound {
        entity: "HuntItem".to_string(),
        id: id.to_string(),
    }
}

const ITEM_COLUMNS: &str = "id, name, description, identifier, points, created_at, updated_at";

/// SQLite implementation of HuntItemRepository.
pub struct SqliteHuntItemRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteHuntItemRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HuntItemRepository for SqliteHuntItemRepository {
    async fn create(&self, item: &HuntItem) -> Result<HuntItem, DbError> {
        sqlx::query(
            r#"
            INSERT INTO hunt_items (id, name, description, identifier, points, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.identifier)
        .bind(item.points)
        .bind(format_timestamp(item.created_at))
        .bind(format_timestamp(item.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(item.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HuntItem>, DbError> {
        let row: Option<SqliteHuntItemRow> =
            sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM hunt_items WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<HuntItem>, DbError> {
        let row: Option<SqliteHuntItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM hunt_items WHERE identifier = ?"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> Result<Vec<HuntItem>, DbError> {
        let rows: Vec<SqliteHuntItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM hunt_items ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &HuntItemUpdate) -> Result<HuntItem, DbError> {
        let mut item = self.get(id).await?.ok_or_else(|| item_not_found(id))?;
        item.apply(update);

        sqlx::query(
            r#"
            UPDATE hunt_items SET name = ?, description = ?, points = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.points)
        .bind(format_timestamp(item.updated_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| item_not_found(id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM hunt_items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of HuntItemRepository.
pub struct PgHuntItemRepository {
    pool: sqlx::PgPool,
}

impl PgHuntItemRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HuntItemRepository for PgHuntItemRepository {
    async fn create(&self, item: &HuntItem) -> Result<HuntItem, DbError> {
        sqlx::query(
            r#"
            INSERT INTO hunt_items (id, name, description, identifier, points, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.identifier)
        .bind(item.points)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HuntItem>, DbError> {
        let row: Option<PgHuntItemRow> =
            sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM hunt_items WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<HuntItem>, DbError> {
        let row: Option<PgHuntItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM hunt_items WHERE identifier = $1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<HuntItem>, DbError> {
        let rows: Vec<PgHuntItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM hunt_items ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, update: &HuntItemUpdate) -> Result<HuntItem, DbError> {
        let row: Option<PgHuntItemRow> = sqlx::query_as(&format!(
            r#"
            UPDATE hunt_items SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                points = COALESCE($3, points),
                updated_at = NOW()
            WHERE id = $4
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.points)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into).ok_or_else(|| item_not_found(id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM hunt_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Factory function to create the appropriate repository based on pool type.
pub fn create_hunt_item_repository(pool: &DbPool) -> Box<dyn HuntItemRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteHuntItemRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgHuntItemRepository::new(pool.clone())),
    }
}

#[derive(sqlx::FromRow)]
struct SqliteHuntItemRow {
    id: String,
    name: String,
    description: String,
    identifier: String,
    points: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteHuntItemRow> for HuntItem {
    type Error = DbError;

    fn try_from(row: SqliteHuntItemRow) -> Result<Self, Self::Error> {
        Ok(HuntItem {
            id: Uuid::parse_str(&row.id).map_err(DbError::invalid_uuid)?,
            name: row.name,
            description: row.description,
            identifier: row.identifier,
            points: row.points,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgHuntItemRow {
    id: Uuid,
    name: String,
    description: String,
    identifier: String,
    points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PgHuntItemRow> for HuntItem {
    fn from(row: PgHuntItemRow) -> Self {
        HuntItem {
            id: row.id,
            name: row.name,
            description: row.description,
            identifier: row.identifier,
            points: row.points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn repo() -> Box<dyn HuntItemRepository> {
        create_hunt_item_repository(&test_pool().await)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;
        let item = HuntItem::new("Clock Tower", "Look up", "CLOCK-7", 30);
        repo.create(&item).await.unwrap();

        let by_id = repo.get(item.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Clock Tower");
        let by_code = repo.get_by_identifier("CLOCK-7").await.unwrap().unwrap();
        assert_eq!(by_code.id, item.id);
        assert!(repo.get_by_identifier("clock-7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identifier_is_constraint() {
        let repo = repo().await;
        repo.create(&HuntItem::new("A", "", "DUP", 1)).await.unwrap();

        let result = repo.create(&HuntItem::new("B", "", "DUP", 2)).await;
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_negative_points_rejected_by_schema() {
        let repo = repo().await;
        let result = repo.create(&HuntItem::new("Neg", "", "NEG", -1)).await;
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_list_most_recent_first() {
        let repo = repo().await;
        let mut first = HuntItem::new("First", "", "ONE", 1);
        first.created_at = Utc::now() - chrono::Duration::minutes(5);
        let second = HuntItem::new("Second", "", "TWO", 2);
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_update_keeps_identifier() {
        let repo = repo().await;
        let item = HuntItem::new("Bench", "Old bench", "BENCH", 10);
        repo.create(&item).await.unwrap();

        let updated = repo
            .update(
                item.id,
                &HuntItemUpdate {
                    description: Some("Painted bench".to_string()),
                    points: Some(15),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Bench");
        assert_eq!(updated.description, "Painted bench");
        assert_eq!(updated.points, 15);
        assert_eq!(updated.identifier, "BENCH");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = repo().await;
        let missing = Uuid::new_v4();

        let result = repo.update(missing, &HuntItemUpdate::default()).await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
        assert!(!repo.delete(missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let item = HuntItem::new("Gate", "", "GATE", 5);
        repo.create(&item).await.unwrap();

        assert!(repo.delete(item.id).await.unwrap());
        assert!(repo.get(item.id).await.unwrap().is_none());
    }
}
