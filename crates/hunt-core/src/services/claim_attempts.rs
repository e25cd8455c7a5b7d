//! Admin queries and clears over users' claim attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{AdminAction, AdminAuditRecord};
use crate::claim::{count_failed, ClaimAttempt, ClaimAttemptFilter, ClearPolicy, UserClaimAttempt};
use crate::db::{AuditRepository, UserRepository};
use crate::error::ServiceError;
use crate::rate_limit::RateLimitPolicy;

/// Limit applied when a query does not set one.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Largest limit a query may request.
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Parameters for listing claim attempts across users.
#[derive(Debug, Clone, Default)]
pub struct ClaimAttemptQuery {
    /// Exact, case-insensitive user email.
    pub email: Option<String>,
    /// Only failed attempts.
    pub failed_only: bool,
    /// Maximum attempts returned; `None` or `0` selects the default.
    pub limit: Option<usize>,
}

impl ClaimAttemptQuery {
    /// Resolves the limit, applying the default and the cap.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            None | Some(0) => DEFAULT_QUERY_LIMIT,
            Some(n) => n.min(MAX_QUERY_LIMIT),
        }
    }
}

/// Aggregate counts over the filtered attempts, before truncation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAttemptStats {
    pub total: usize,
    pub failed: usize,
    pub successful: usize,
    pub unique_users: usize,
}

impl ClaimAttemptStats {
    fn from_attempts(attempts: &[UserClaimAttempt]) -> Self {
        let failed = attempts.iter().filter(|a| !a.attempt.success).count();
        let unique_users = attempts.iter().map(|a| a.user_id).collect::<HashSet<Uuid>>();
        Self {
            total: attempts.len(),
            failed,
            successful: attempts.len() - failed,
            unique_users: unique_users.len(),
        }
    }
}

/// Result of a claim-attempt query.
#[derive(Debug, Clone)]
pub struct ClaimAttemptReport {
    /// Newest first, truncated to the limit.
    pub attempts: Vec<UserClaimAttempt>,
    pub stats: ClaimAttemptStats,
}

/// Attempt counts captured before and after a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptCounts {
    pub attempts: usize,
    pub failed_attempts: usize,
}

impl AttemptCounts {
    fn of(attempts: &[ClaimAttempt]) -> Self {
        Self {
            attempts: attempts.len(),
            failed_attempts: count_failed(attempts),
        }
    }
}

/// Result of clearing a user's attempts.
#[derive(Debug, Clone)]
pub struct ClearOutcome {
    /// Confirmation naming the user and the policy.
    pub message: String,
    pub removed: u64,
    pub before: AttemptCounts,
    pub after: AttemptCounts,
}

/// Query and clear operations over claim attempts.
pub struct ClaimAttemptService<'a> {
    users: &'a dyn UserRepository,
    audit: &'a dyn AuditRepository,
    policy: RateLimitPolicy,
}

impl<'a> ClaimAttemptService<'a> {
    pub fn new(
        users: &'a dyn UserRepository,
        audit: &'a dyn AuditRepository,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            users,
            audit,
            policy,
        }
    }

    /// Lists attempts across users, newest first, with stats over the
    /// whole filtered set.
    pub async fn query(&self, query: &ClaimAttemptQuery) -> Result<ClaimAttemptReport, ServiceError> {
        let filter = ClaimAttemptFilter {
            email: query.email.clone(),
            failed_only: query.failed_only,
        };
        let mut attempts = self.users.list_claim_attempts(&filter).await?;
        let stats = ClaimAttemptStats::from_attempts(&attempts);

        // Stable, so equal timestamps keep their per-user insertion order.
        attempts.sort_by(|a, b| b.attempt.timestamp.cmp(&a.attempt.timestamp));
        attempts.truncate(query.effective_limit());

        debug!(
            total = stats.total,
            returned = attempts.len(),
            "Queried claim attempts"
        );

        Ok(ClaimAttemptReport { attempts, stats })
    }

    /// Removes the attempts `policy` drops from the user's list and records
    /// an audit entry.
    ///
    /// Attempts are removed by id, so attempts appended concurrently are
    /// never lost and concurrent clears converge.
    pub async fn clear(
        &self,
        actor: &str,
        email: &str,
        policy: ClearPolicy,
        now: DateTime<Utc>,
    ) -> Result<ClearOutcome, ServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", email))?;

        let attempts = self.users.claim_attempts(user.id).await?;
        let (retained, dropped): (Vec<ClaimAttempt>, Vec<ClaimAttempt>) = attempts
            .iter()
            .cloned()
            .partition(|a| policy.retains(a, now, self.policy.window));

        let dropped_ids: Vec<Uuid> = dropped.iter().map(|a| a.id).collect();
        let removed = self
            .users
            .remove_claim_attempts(user.id, &dropped_ids)
            .await?;

        let before = AttemptCounts::of(&attempts);
        let after = AttemptCounts::of(&retained);

        let record = AdminAuditRecord::new(AdminAction::ClearClaimAttempts, actor)
            .with_target_user(&user.email)
            .with_change(Some(json!(before)), Some(json!(after)))
            .at(now);
        self.audit.log(&record).await?;

        info!(
            actor = %actor,
            email = %user.email,
            policy = %policy,
            removed,
            "Cleared claim attempts"
        );

        Ok(ClearOutcome {
            message: format!(
                "Cleared {} claim attempts for {}",
                policy.as_str(),
                user.email
            ),
            removed,
            before,
            after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, User};
    use crate::db::mocks::{MockAuditRepository, MockUserRepository};
    use chrono::Duration;

    fn player(email: &str) -> User {
        User::new(email, email.split('@').next().unwrap_or(email), "hash", Role::Player)
    }

    #[test]
    fn test_effective_limit() {
        let mut query = ClaimAttemptQuery::default();
        assert_eq!(query.effective_limit(), 100);
        query.limit = Some(0);
        assert_eq!(query.effective_limit(), 100);
        query.limit = Some(5);
        assert_eq!(query.effective_limit(), 5);
        query.limit = Some(50_000);
        assert_eq!(query.effective_limit(), 1000);
    }

    #[tokio::test]
    async fn test_query_sorts_newest_first_and_counts_before_truncating() {
        let alice = player("alice@example.com");
        let bob = player("bob@example.com");
        let users = MockUserRepository::with_users(vec![alice.clone(), bob.clone()]);
        let audit = MockAuditRepository::new();
        let now = Utc::now();

        users
            .set_claim_attempts(
                alice.id,
                vec![
                    ClaimAttempt::failed("A1", now - Duration::minutes(30)),
                    ClaimAttempt::succeeded("A2", Uuid::new_v4(), now - Duration::minutes(2)),
                ],
            )
            .await;
        users
            .set_claim_attempts(
                bob.id,
                vec![ClaimAttempt::failed("B1", now - Duration::minutes(10))],
            )
            .await;

        let service = ClaimAttemptService::new(&users, &audit, RateLimitPolicy::default());
        let report = service
            .query(&ClaimAttemptQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        let identifiers: Vec<&str> = report
            .attempts
            .iter()
            .map(|a| a.attempt.identifier.as_str())
            .collect();
        assert_eq!(identifiers, vec!["A2", "B1"]);
        assert_eq!(
            report.stats,
            ClaimAttemptStats {
                total: 3,
                failed: 2,
                successful: 1,
                unique_users: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_query_ties_keep_insertion_order() {
        let alice = player("alice@example.com");
        let users = MockUserRepository::with_users(vec![alice.clone()]);
        let audit = MockAuditRepository::new();
        let now = Utc::now();
        users
            .set_claim_attempts(
                alice.id,
                vec![ClaimAttempt::failed("FIRST", now), ClaimAttempt::failed("SECOND", now)],
            )
            .await;

        let service = ClaimAttemptService::new(&users, &audit, RateLimitPolicy::default());
        let report = service.query(&ClaimAttemptQuery::default()).await.unwrap();

        assert_eq!(report.attempts[0].attempt.identifier, "FIRST");
        assert_eq!(report.attempts[1].attempt.identifier, "SECOND");
    }

    #[tokio::test]
    async fn test_query_filters_by_email_and_failed() {
        let alice = player("alice@example.com");
        let bob = player("bob@example.com");
        let users = MockUserRepository::with_users(vec![alice.clone(), bob.clone()]);
        let audit = MockAuditRepository::new();
        let now = Utc::now();
        users
            .set_claim_attempts(
                alice.id,
                vec![
                    ClaimAttempt::failed("A1", now),
                    ClaimAttempt::succeeded("A2", Uuid::new_v4(), now),
                ],
            )
            .await;
        users
            .set_claim_attempts(bob.id, vec![ClaimAttempt::failed("B1", now)])
            .await;

        let service = ClaimAttemptService::new(&users, &audit, RateLimitPolicy::default());
        let report = service
            .query(&ClaimAttemptQuery {
                email: Some("ALICE@example.com".to_string()),
                failed_only: true,
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].attempt.identifier, "A1");
        assert_eq!(report.stats.unique_users, 1);
        assert_eq!(report.stats.successful, 0);
    }

    #[tokio::test]
    async fn test_clear_rate_limit_window_and_audit() {
        let alice = player("alice@example.com");
        let users = MockUserRepository::with_users(vec![alice.clone()]);
        let audit = MockAuditRepository::new();
        let now = Utc::now();
        let old = ClaimAttempt::failed("OLD", now - Duration::minutes(20));
        let recent = ClaimAttempt::failed("RECENT", now - Duration::minutes(5));
        let ok = ClaimAttempt::succeeded("OK", Uuid::new_v4(), now - Duration::minutes(1));
        users
            .set_claim_attempts(alice.id, vec![old.clone(), recent, ok.clone()])
            .await;

        let service = ClaimAttemptService::new(&users, &audit, RateLimitPolicy::default());
        let outcome = service
            .clear("admin@localhost", "Alice@Example.com", ClearPolicy::RateLimit, now)
            .await
            .unwrap();

        assert_eq!(outcome.removed, 1);
        assert!(outcome.message.contains("alice@example.com"));
        assert!(outcome.message.contains("rate-limit"));
        assert_eq!(users.attempts_snapshot(alice.id).await, vec![old, ok]);

        let records = audit.snapshot().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AdminAction::ClearClaimAttempts);
        assert_eq!(records[0].target_user.as_deref(), Some("alice@example.com"));
        assert_eq!(records[0].before, Some(json!({"attempts": 3, "failedAttempts": 2})));
        assert_eq!(records[0].after, Some(json!({"attempts": 2, "failedAttempts": 1})));
    }

    #[tokio::test]
    async fn test_clear_all_and_failed() {
        let alice = player("alice@example.com");
        let users = MockUserRepository::with_users(vec![alice.clone()]);
        let audit = MockAuditRepository::new();
        let now = Utc::now();
        let ok = ClaimAttempt::succeeded("OK", Uuid::new_v4(), now);
        users
            .set_claim_attempts(
                alice.id,
                vec![ClaimAttempt::failed("X", now), ok.clone(), ClaimAttempt::failed("Y", now)],
            )
            .await;
        let service = ClaimAttemptService::new(&users, &audit, RateLimitPolicy::default());

        let outcome = service
            .clear("admin@localhost", "alice@example.com", ClearPolicy::Failed, now)
            .await
            .unwrap();
        assert_eq!(outcome.removed, 2);
        assert_eq!(users.attempts_snapshot(alice.id).await, vec![ok]);

        let outcome = service
            .clear("admin@localhost", "alice@example.com", ClearPolicy::All, now)
            .await
            .unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.after.attempts, 0);
        assert!(users.attempts_snapshot(alice.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_unknown_user() {
        let users = MockUserRepository::new();
        let audit = MockAuditRepository::new();
        let service = ClaimAttemptService::new(&users, &audit, RateLimitPolicy::default());

        let result = service
            .clear("admin@localhost", "ghost@example.com", ClearPolicy::All, Utc::now())
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert!(audit.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_clear_keeps_attempt_appended_after_read() {
        let alice = player("alice@example.com");
        let users = MockUserRepository::with_users(vec![alice.clone()]);
        let now = Utc::now();
        let seen = ClaimAttempt::failed("SEEN", now);
        users.set_claim_attempts(alice.id, vec![seen.clone()]).await;

        // A clear read [SEEN]; a claim lands before its delete runs.
        let late = ClaimAttempt::failed("LATE", now);
        users.append_claim_attempt(alice.id, &late).await.unwrap();
        let removed = users.remove_claim_attempts(alice.id, &[seen.id]).await.unwrap();
        assert_eq!(removed, 1);

        // A second clear working from the same stale read converges.
        let removed = users.remove_claim_attempts(alice.id, &[seen.id]).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(users.attempts_snapshot(alice.id).await, vec![late]);
    }
}
