//! Mock implementation of UserRepository for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{normalize_email, User, UserFilter};
use crate::claim::{ClaimAttempt, ClaimAttemptFilter, HistoryEntry, UserClaimAttempt};
use crate::db::{DbError, UserRepository};

#[derive(Default)]
struct MockState {
    /// Users in creation order.
    users: Vec<User>,
    attempts: HashMap<Uuid, Vec<ClaimAttempt>>,
    history: HashMap<Uuid, Vec<HistoryEntry>>,
}

/// Mock implementation of UserRepository using in-memory storage.
#[derive(Clone, Default)]
pub struct MockUserRepository {
    state: Arc<RwLock<MockState>>,
}

impl MockUserRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock repository pre-populated with users.
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                users,
                ..Default::default()
            })),
        }
    }

    /// Replaces a user's attempts wholesale.
    pub async fn set_claim_attempts(&self, user_id: Uuid, attempts: Vec<ClaimAttempt>) {
        self.state.write().await.attempts.insert(user_id, attempts);
    }

    /// Gets a snapshot of a user's attempts.
    pub async fn attempts_snapshot(&self, user_id: Uuid) -> Vec<ClaimAttempt> {
        self.state
            .read()
            .await
            .attempts
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, user: &User) -> Result<User, DbError> {
        let mut state = self.state.write().await;
        let email = normalize_email(&user.email);

        if state.users.iter().any(|u| u.email == email) {
            return Err(DbError::Constraint(format!(
                "User with email '{}' already exists",
                email
            )));
        }

        let mut user = user.clone();
        user.email = email;
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = normalize_email(email);
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        let email = filter.email.as_deref().map(normalize_email);
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .filter(|u| email.as_ref().map_or(true, |e| &u.email == e))
            .cloned()
            .collect())
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        Ok(!self.state.read().await.users.is_empty())
    }

    async fn claim_attempts(&self, user_id: Uuid) -> Result<Vec<ClaimAttempt>, DbError> {
        Ok(self.attempts_snapshot(user_id).await)
    }

    async fn history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, DbError> {
        let state = self.state.read().await;
        Ok(state.history.get(&user_id).cloned().unwrap_or_default())
    }

    async fn append_claim_attempt(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
    ) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(DbError::Constraint(format!("Unknown user {}", user_id)));
        }
        state
            .attempts
            .entry(user_id)
            .or_default()
            .push(attempt.clone());
        Ok(())
    }

    async fn record_claim(
        &self,
        user_id: Uuid,
        attempt: &ClaimAttempt,
        entry: &HistoryEntry,
    ) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(DbError::Constraint(format!("Unknown user {}", user_id)));
        }
        state
            .attempts
            .entry(user_id)
            .or_default()
            .push(attempt.clone());
        state.history.entry(user_id).or_default().push(entry.clone());
        Ok(())
    }

    async fn remove_claim_attempts(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, DbError> {
        let mut state = self.state.write().await;
        let Some(attempts) = state.attempts.get_mut(&user_id) else {
            return Ok(0);
        };
        let before = attempts.len();
        attempts.retain(|a| !ids.contains(&a.id));
        Ok((before - attempts.len()) as u64)
    }

    async fn list_claim_attempts(
        &self,
        filter: &ClaimAttemptFilter,
    ) -> Result<Vec<UserClaimAttempt>, DbError> {
        let email = filter.email.as_deref().map(normalize_email);
        let state = self.state.read().await;

        let mut result = Vec::new();
        for user in &state.users {
            if email.as_ref().is_some_and(|e| &user.email != e) {
                continue;
            }
            let Some(attempts) = state.attempts.get(&user.id) else {
                continue;
            };
            result.extend(
                attempts
                    .iter()
                    .filter(|a| !filter.failed_only || !a.success)
                    .map(|a| UserClaimAttempt {
                        user_id: user.id,
                        user_email: user.email.clone(),
                        user_name: user.name.clone(),
                        attempt: a.clone(),
                    }),
            );
        }
        Ok(result)
    }
}
