//! Mock implementation of HuntItemRepository for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{DbError, HuntItemRepository};
use crate::hunt_item::{HuntItem, HuntItemUpdate};

/// Mock implementation of HuntItemRepository using in-memory storage.
#[derive(Clone, Default)]
pub struct MockHuntItemRepository {
    items: Arc<RwLock<Vec<HuntItem>>>,
}

impl MockHuntItemRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock repository pre-populated with items.
    pub fn with_items(items: Vec<HuntItem>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }
}

#[async_trait]
impl HuntItemRepository for MockHuntItemRepository {
    async fn create(&self, item: &HuntItem) -> Result<HuntItem, DbError> {
        let mut items = self.items.write().await;
        if items.iter().any(|i| i.identifier == item.identifier) {
            return Err(DbError::Constraint(format!(
                "Hunt item with identifier '{}' already exists",
                item.identifier
            )));
        }
        if item.points < 0 {
            return Err(DbError::Constraint("points must be >= 0".to_string()));
        }
        items.push(item.clone());
        Ok(item.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HuntItem>, DbError> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<HuntItem>, DbError> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .find(|i| i.identifier == identifier)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<HuntItem>, DbError> {
        let mut items = self.items.read().await.clone();
        // Later insertions win ties, matching the database ordering.
        items.reverse();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update(&self, id: Uuid, update: &HuntItemUpdate) -> Result<HuntItem, DbError> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DbError::NotFound {
                entity: "HuntItem".to_string(),
                id: id.to_string(),
            })?;
        item.apply(update);
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }
}
