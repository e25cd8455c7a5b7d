//! Claim redemption: the enforcement point for the failed-claim rate limit.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::claim::{ClaimAttempt, HistoryEntry};
use crate::db::{HuntItemRepository, UserRepository};
use crate::error::ServiceError;
use crate::hunt_item::HuntItem;
use crate::rate_limit::{RateLimitPolicy, RateLimitStatus};

/// Result of a successful claim.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    pub item: HuntItem,
    pub points_awarded: i64,
    /// Rate-limit status after the claim was recorded.
    pub rate_limit: RateLimitStatus,
}

/// Records claim attempts and awards items.
pub struct RedemptionService<'a> {
    users: &'a dyn UserRepository,
    items: &'a dyn HuntItemRepository,
    policy: RateLimitPolicy,
}

impl<'a> RedemptionService<'a> {
    pub fn new(
        users: &'a dyn UserRepository,
        items: &'a dyn HuntItemRepository,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            users,
            items,
            policy,
        }
    }

    /// Attempts to claim the item with `identifier` for the user.
    ///
    /// A rate-limited user is refused without recording an attempt. An
    /// unknown code or an item the user already holds records a failed
    /// attempt.
    pub async fn claim(
        &self,
        user_id: Uuid,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, ServiceError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "identifier must not be empty".to_string(),
            ));
        }

        let profile = self
            .users
            .get_profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;

        let status = self.policy.evaluate(&profile.claim_attempts, now);
        if status.is_rate_limited {
            warn!(
                user_id = %user_id,
                recent_failed_attempts = status.recent_failed_attempts,
                "Claim refused, user is rate limited"
            );
            return Err(ServiceError::RateLimited {
                retry_after_secs: status.retry_after_secs(now).max(1),
            });
        }

        let Some(item) = self.items.get_by_identifier(identifier).await? else {
            self.users
                .append_claim_attempt(user_id, &ClaimAttempt::failed(identifier, now))
                .await?;
            info!(user_id = %user_id, "Claim failed, unknown identifier");
            return Err(ServiceError::not_found("HuntItem", identifier));
        };

        if profile.has_claimed(item.id) {
            self.users
                .append_claim_attempt(user_id, &ClaimAttempt::failed(identifier, now))
                .await?;
            info!(user_id = %user_id, item_id = %item.id, "Claim failed, item already claimed");
            return Err(ServiceError::Conflict(format!(
                "Hunt item '{}' has already been claimed",
                item.name
            )));
        }

        let attempt = ClaimAttempt::succeeded(identifier, item.id, now);
        let entry = HistoryEntry {
            item_id: Some(item.id),
            item_name: item.name.clone(),
            points: item.points,
            claimed_at: now,
        };
        self.users.record_claim(user_id, &attempt, &entry).await?;

        let mut attempts = profile.claim_attempts;
        attempts.push(attempt);
        let rate_limit = self.policy.evaluate(&attempts, now);

        info!(
            user_id = %user_id,
            item_id = %item.id,
            points = item.points,
            "Hunt item claimed"
        );

        Ok(ClaimOutcome {
            points_awarded: item.points,
            item,
            rate_limit,
        })
    }
}
