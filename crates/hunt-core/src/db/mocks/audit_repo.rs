//! Mock implementation of AuditRepository for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::audit::AdminAuditRecord;
use crate::db::{AuditRepository, DbError};

/// In-memory audit trail.
#[derive(Clone, Default)]
pub struct MockAuditRepository {
    records: Arc<RwLock<Vec<AdminAuditRecord>>>,
}

impl MockAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in the order they were logged.
    pub async fn snapshot(&self) -> Vec<AdminAuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for MockAuditRepository {
    async fn log(&self, record: &AdminAuditRecord) -> Result<(), DbError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AdminAuditRecord>, DbError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn by_target_user(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<AdminAuditRecord>, DbError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.target_user.as_deref() == Some(email))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
