//! Failed-claim rate limiting.
//!
//! A user is throttled once they accumulate too many failed claim attempts
//! inside a trailing window. The same evaluation backs the enforcement in
//! [`crate::RedemptionService`] and the status shown to admins, so the
//! displayed and the enforced limits cannot drift apart.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::ClaimAttempt;

/// Default trailing window for counting failed attempts.
pub const DEFAULT_WINDOW_MINUTES: i64 = 15;

/// Default number of failed attempts that triggers the limit.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 10;

/// Window length and threshold for failed-claim throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Trailing window length.
    pub window: Duration,
    /// Failed attempts within the window at which the user is limited.
    pub max_failed_attempts: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(DEFAULT_WINDOW_MINUTES),
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
        }
    }
}

/// Result of evaluating a user's attempts at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    /// Failed attempts inside the window.
    pub recent_failed_attempts: u32,
    /// Whether further claims are refused.
    pub is_rate_limited: bool,
    /// Failed attempts left before the limit applies.
    pub remaining_attempts: u32,
    /// Start of the evaluated window.
    pub window_start: DateTime<Utc>,
    /// First instant at which the user is no longer limited, if currently limited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl RateLimitStatus {
    /// Seconds until the limit lifts, rounded up; zero when not limited.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.resets_at {
            Some(resets_at) if resets_at > now => {
                let millis = (resets_at - now).num_milliseconds();
                ((millis + 999) / 1000) as u64
            }
            _ => 0,
        }
    }
}

impl RateLimitPolicy {
    /// Creates a policy from a window in minutes and a threshold.
    pub fn new(window_minutes: i64, max_failed_attempts: u32) -> Self {
        Self {
            window: Duration::minutes(window_minutes),
            max_failed_attempts,
        }
    }

    /// Start of the window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Returns true if `timestamp` falls in `[now - window, now]`.
    pub fn in_window(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        timestamp >= self.window_start(now) && timestamp <= now
    }

    /// Evaluates the attempts against this policy at `now`.
    ///
    /// Pure: the result depends only on the attempts and `now`, so callers
    /// re-evaluate whenever either changes.
    pub fn evaluate(&self, attempts: &[ClaimAttempt], now: DateTime<Utc>) -> RateLimitStatus {
        let mut recent_failures: Vec<DateTime<Utc>> = attempts
            .iter()
            .filter(|a| !a.success && self.in_window(a.timestamp, now))
            .map(|a| a.timestamp)
            .collect();

        let recent_failed_attempts = recent_failures.len() as u32;
        let is_rate_limited = recent_failed_attempts >= self.max_failed_attempts;
        let remaining_attempts = self
            .max_failed_attempts
            .saturating_sub(recent_failed_attempts);

        // Limited until enough of the oldest failures age out to bring the
        // count back under the threshold. The window start is inclusive, so a
        // failure leaves it one tick after `timestamp + window`.
        let resets_at = if is_rate_limited && self.max_failed_attempts > 0 {
            recent_failures.sort();
            let must_expire = (recent_failed_attempts - self.max_failed_attempts) as usize;
            recent_failures
                .get(must_expire)
                .map(|oldest| *oldest + self.window + Duration::nanoseconds(1))
        } else {
            None
        };

        RateLimitStatus {
            recent_failed_attempts,
            is_rate_limited,
            remaining_attempts,
            window_start: self.window_start(now),
            resets_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn failures(now: DateTime<Utc>, minutes_ago: &[i64]) -> Vec<ClaimAttempt> {
        minutes_ago
            .iter()
            .map(|m| ClaimAttempt::failed("WRONG", now - Duration::minutes(*m)))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let policy = RateLimitPolicy::default();
        assert_eq!(policy.window, Duration::minutes(15));
        assert_eq!(policy.max_failed_attempts, 10);
    }

    #[test]
    fn test_empty_attempts() {
        let now = Utc::now();
        let status = RateLimitPolicy::default().evaluate(&[], now);

        assert_eq!(status.recent_failed_attempts, 0);
        assert!(!status.is_rate_limited);
        assert_eq!(status.remaining_attempts, 10);
        assert_eq!(status.resets_at, None);
    }

    #[test]
    fn test_ten_recent_failures_limit_the_user() {
        let now = Utc::now();
        let attempts = failures(now, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let status = RateLimitPolicy::default().evaluate(&attempts, now);

        assert_eq!(status.recent_failed_attempts, 10);
        assert!(status.is_rate_limited);
        assert_eq!(status.remaining_attempts, 0);
        // The oldest failure (10 minutes ago) leaves the window in 5 minutes.
        assert_eq!(
            status.resets_at,
            Some(now + Duration::minutes(5) + Duration::nanoseconds(1))
        );
        assert_eq!(status.retry_after_secs(now), 300);
    }

    #[test]
    fn test_old_failures_and_successes_not_counted() {
        let now = Utc::now();
        let mut attempts = failures(now, &[16, 30, 60, 2]);
        attempts.push(ClaimAttempt::succeeded("OK", Uuid::new_v4(), now));

        let status = RateLimitPolicy::default().evaluate(&attempts, now);

        assert_eq!(status.recent_failed_attempts, 1);
        assert_eq!(status.remaining_attempts, 9);
        assert!(!status.is_rate_limited);
    }

    #[test]
    fn test_future_attempts_not_counted() {
        let now = Utc::now();
        let attempts = vec![ClaimAttempt::failed("LATER", now + Duration::minutes(1))];
        assert_eq!(
            RateLimitPolicy::default()
                .evaluate(&attempts, now)
                .recent_failed_attempts,
            0
        );
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let attempts = vec![ClaimAttempt::failed("EDGE", now - Duration::minutes(15))];
        assert_eq!(
            RateLimitPolicy::default()
                .evaluate(&attempts, now)
                .recent_failed_attempts,
            1
        );
    }

    #[test]
    fn test_limited_iff_threshold_reached() {
        let now = Utc::now();
        for max in 1..=12u32 {
            let policy = RateLimitPolicy::new(15, max);
            for count in 0..=15i64 {
                let minutes: Vec<i64> = (0..count).map(|i| i % 14).collect();
                let status = policy.evaluate(&failures(now, &minutes), now);
                assert_eq!(
                    status.is_rate_limited,
                    status.recent_failed_attempts >= max,
                    "max={max} count={count}"
                );
                assert_eq!(
                    status.remaining_attempts,
                    max.saturating_sub(status.recent_failed_attempts)
                );
            }
        }
    }

    #[test]
    fn test_adding_recent_failure_is_monotonic() {
        let now = Utc::now();
        let policy = RateLimitPolicy::default();
        let mut attempts = failures(now, &[40, 20]);
        attempts.push(ClaimAttempt::succeeded("OK", Uuid::new_v4(), now));

        let mut previous = policy.evaluate(&attempts, now);
        for minute in [14, 0, 7, 3, 3, 12, 1, 9, 5, 2, 6, 8, 11] {
            attempts.push(ClaimAttempt::failed("WRONG", now - Duration::minutes(minute)));
            let next = policy.evaluate(&attempts, now);

            assert!(next.recent_failed_attempts >= previous.recent_failed_attempts);
            assert!(next.remaining_attempts <= previous.remaining_attempts);
            previous = next;
        }
        assert!(previous.is_rate_limited);
    }

    #[test]
    fn test_resets_at_with_more_failures_than_threshold() {
        let now = Utc::now();
        let policy = RateLimitPolicy::new(15, 2);
        // Four failures: the two oldest must age out before the user drops to one.
        let attempts = failures(now, &[12, 10, 4, 1]);

        let status = policy.evaluate(&attempts, now);

        assert!(status.is_rate_limited);
        assert_eq!(
            status.resets_at,
            Some(now - Duration::minutes(4) + Duration::minutes(15) + Duration::nanoseconds(1))
        );
    }

    #[test]
    fn test_limit_lifts_exactly_at_resets_at() {
        let now = Utc::now();
        let policy = RateLimitPolicy::default();
        let attempts = failures(now, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let resets_at = policy.evaluate(&attempts, now).resets_at.unwrap();

        let just_before = policy.evaluate(&attempts, resets_at - Duration::nanoseconds(1));
        assert!(just_before.is_rate_limited);
        assert_eq!(just_before.recent_failed_attempts, 10);

        let at_reset = policy.evaluate(&attempts, resets_at);
        assert!(!at_reset.is_rate_limited);
        assert_eq!(at_reset.recent_failed_attempts, 9);
        assert_eq!(at_reset.resets_at, None);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = RateLimitPolicy::default().evaluate(&[], Utc::now());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["recentFailedAttempts"], 0);
        assert_eq!(json["isRateLimited"], false);
        assert_eq!(json["remainingAttempts"], 10);
        assert!(json.get("resetsAt").is_none());
    }
}
