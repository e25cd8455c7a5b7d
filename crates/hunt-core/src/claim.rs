//! Claim attempts, claimed-item history and the admin clear policies.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::User;

/// A single try by a user to redeem a hunt item with an identifier code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAttempt {
    /// Unique identifier of the attempt.
    pub id: Uuid,
    /// The code the user submitted.
    pub identifier: String,
    /// Whether the attempt redeemed an item.
    pub success: bool,
    /// When the attempt was made.
    pub timestamp: DateTime<Utc>,
    /// The redeemed item, set only for successful attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
}

impl ClaimAttempt {
    /// Creates a failed attempt.
    pub fn failed(identifier: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: identifier.into(),
            success: false,
            timestamp,
            item_id: None,
        }
    }

    /// Creates a successful attempt for the given item.
    pub fn succeeded(
        identifier: impl Into<String>,
        item_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: identifier.into(),
            success: true,
            timestamp,
            item_id: Some(item_id),
        }
    }
}

/// A hunt item the user has claimed, with the points awarded at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The claimed item; `None` once the item has been deleted.
    pub item_id: Option<Uuid>,
    /// Item name captured at claim time.
    pub item_name: String,
    /// Points awarded.
    pub points: i64,
    /// When the item was claimed.
    pub claimed_at: DateTime<Utc>,
}

/// A user together with their claim attempts and claimed-item history.
///
/// Both sequences are in insertion order, which is chronological.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: User,
    pub claim_attempts: Vec<ClaimAttempt>,
    pub history: Vec<HistoryEntry>,
}

impl UserProfile {
    /// Returns true if the user already claimed the item.
    pub fn has_claimed(&self, item_id: Uuid) -> bool {
        self.history.iter().any(|h| h.item_id == Some(item_id))
    }

    /// Total points across the history.
    pub fn total_points(&self) -> i64 {
        self.history.iter().map(|h| h.points).sum()
    }
}

/// Counts failed attempts in a slice.
pub fn count_failed(attempts: &[ClaimAttempt]) -> usize {
    attempts.iter().filter(|a| !a.success).count()
}

/// A claim attempt annotated with the user who made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaimAttempt {
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub attempt: ClaimAttempt,
}

/// Filter for listing claim attempts across users.
#[derive(Debug, Clone, Default)]
pub struct ClaimAttemptFilter {
    /// Exact, case-insensitive user email.
    pub email: Option<String>,
    /// Only failed attempts.
    pub failed_only: bool,
}

/// Which subset of a user's claim attempts an admin clear removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearPolicy {
    /// Remove every failed attempt, keep the successful ones.
    #[serde(rename = "failed")]
    Failed,
    /// Remove everything.
    #[serde(rename = "all")]
    All,
    /// Remove failed attempts inside the trailing rate-limit window.
    #[serde(rename = "rate-limit")]
    RateLimit,
}

impl ClearPolicy {
    /// Returns the wire name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearPolicy::Failed => "failed",
            ClearPolicy::All => "all",
            ClearPolicy::RateLimit => "rate-limit",
        }
    }

    /// Returns true if `attempt` survives this policy.
    ///
    /// For [`ClearPolicy::RateLimit`] an attempt survives when it succeeded
    /// or is strictly older than `now - window`.
    pub fn retains(&self, attempt: &ClaimAttempt, now: DateTime<Utc>, window: Duration) -> bool {
        match self {
            ClearPolicy::Failed => attempt.success,
            ClearPolicy::All => false,
            ClearPolicy::RateLimit => attempt.success || attempt.timestamp < now - window,
        }
    }

    /// Applies the policy, returning the retained attempts in their original order.
    pub fn apply(
        &self,
        attempts: &[ClaimAttempt],
        now: DateTime<Utc>,
        window: Duration,
    ) -> Vec<ClaimAttempt> {
        attempts
            .iter()
            .filter(|a| self.retains(a, now, window))
            .cloned()
            .collect()
    }
}

impl fmt::Display for ClearPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown clear policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid clear type '{0}'. Expected one of: failed, all, rate-limit")]
pub struct UnknownClearPolicy(pub String);

impl FromStr for ClearPolicy {
    type Err = UnknownClearPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "failed" => Ok(ClearPolicy::Failed),
            "all" => Ok(ClearPolicy::All),
            "rate-limit" => Ok(ClearPolicy::RateLimit),
            other => Err(UnknownClearPolicy(other.to_string())),
        }
    }
}
