//! Request and response types for the HTTP API.
//!
//! Also used by the admin client in `hunt-cli` to decode responses.

use axum::extract::{FromRequest, FromRequestParts};
use chrono::{DateTime, Utc};
use hunt_core::{
    AdminAuditRecord, ClaimAttempt, ClaimAttemptStats, HistoryEntry, HuntItem, RateLimitStatus,
    User, UserClaimAttempt,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// JSON body extractor that rejects with an [`ApiError`] body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor that rejects with an [`ApiError`] body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub uptime_seconds: u64,
}

/// Database health details.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    /// "sqlite" or "postgres".
    pub backend: String,
    pub pool_size: u32,
    pub idle_connections: usize,
}

// ============================================================================
// Generic
// ============================================================================

/// Body of operations that only report success.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Login request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// "admin" or "player".
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

/// Response carrying the signed-in account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: UserSummary,
}

// ============================================================================
// Hunt items
// ============================================================================

/// A hunt item as returned by the API.
///
/// The claim code is only included for admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HuntItemResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HuntItemResponse {
    /// Public view without the claim code.
    pub fn public(item: HuntItem) -> Self {
        let mut response = Self::from(item);
        response.identifier = None;
        response
    }
}

impl From<HuntItem> for HuntItemResponse {
    fn from(item: HuntItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            identifier: Some(item.identifier),
            points: item.points,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Hunt item list, most recent first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HuntItemListResponse {
    pub success: bool,
    pub hunt_items: Vec<HuntItemResponse>,
}

/// A single hunt item.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HuntItemEnvelope {
    pub success: bool,
    pub hunt_item: HuntItemResponse,
}

/// Request to create a hunt item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateHuntItemRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "Identifier must be 1-100 characters"))]
    pub identifier: String,
    #[validate(range(min = 0, message = "Points must not be negative"))]
    pub points: i64,
}

/// Partial update of a hunt item.
///
/// `identifier` is accepted only so a request that tries to change it can be
/// rejected explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateHuntItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Points must not be negative"))]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub identifier: Option<serde_json::Value>,
}

// ============================================================================
// Claim attempts
// ============================================================================

/// A claim attempt as stored on a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAttemptResponse {
    pub id: Uuid,
    pub identifier: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
}

impl From<ClaimAttempt> for ClaimAttemptResponse {
    fn from(attempt: ClaimAttempt) -> Self {
        Self {
            id: attempt.id,
            identifier: attempt.identifier,
            success: attempt.success,
            timestamp: attempt.timestamp,
            item_id: attempt.item_id,
        }
    }
}

impl From<ClaimAttemptResponse> for ClaimAttempt {
    fn from(attempt: ClaimAttemptResponse) -> Self {
        Self {
            id: attempt.id,
            identifier: attempt.identifier,
            success: attempt.success,
            timestamp: attempt.timestamp,
            item_id: attempt.item_id,
        }
    }
}

/// A claim attempt annotated with its user, for the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserClaimAttemptResponse {
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    #[serde(flatten)]
    pub attempt: ClaimAttemptResponse,
}

impl From<UserClaimAttempt> for UserClaimAttemptResponse {
    fn from(entry: UserClaimAttempt) -> Self {
        Self {
            user_id: entry.user_id,
            user_email: entry.user_email,
            user_name: entry.user_name,
            attempt: entry.attempt.into(),
        }
    }
}

/// Aggregates over the filtered attempts, before the limit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAttemptStatsResponse {
    pub total: usize,
    pub failed: usize,
    pub successful: usize,
    pub unique_users: usize,
}

impl From<ClaimAttemptStats> for ClaimAttemptStatsResponse {
    fn from(stats: ClaimAttemptStats) -> Self {
        Self {
            total: stats.total,
            failed: stats.failed,
            successful: stats.successful,
            unique_users: stats.unique_users,
        }
    }
}

/// Query parameters for listing claim attempts.
///
/// Kept as strings so empty values from HTML forms mean "not set".
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListClaimAttemptsQuery {
    /// Exact user email, case-insensitive.
    pub email: Option<String>,
    /// `true` or `1` to list failed attempts only.
    pub failed: Option<String>,
    /// Maximum attempts returned (default 100, at most 1000).
    pub limit: Option<String>,
}

/// Claim attempts across users.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAttemptsResponse {
    pub success: bool,
    pub claim_attempts: Vec<UserClaimAttemptResponse>,
    pub stats: ClaimAttemptStatsResponse,
}

/// Request to clear a user's claim attempts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearClaimAttemptsRequest {
    pub user_email: String,
    /// One of `failed`, `all`, `rate-limit`.
    pub clear_type: String,
}

/// Result of a clear.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearClaimAttemptsResponse {
    pub success: bool,
    pub message: String,
    pub removed: u64,
}

// ============================================================================
// Users
// ============================================================================

/// A claimed item in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    #[serde(default)]
    pub item_id: Option<Uuid>,
    pub item_name: String,
    pub points: i64,
    pub claimed_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            item_id: entry.item_id,
            item_name: entry.item_name,
            points: entry.points,
            claimed_at: entry.claimed_at,
        }
    }
}

/// Failed-claim rate-limit state at the time of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResponse {
    pub recent_failed_attempts: u32,
    pub is_rate_limited: bool,
    pub remaining_attempts: u32,
    pub window_start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl From<RateLimitStatus> for RateLimitResponse {
    fn from(status: RateLimitStatus) -> Self {
        Self {
            recent_failed_attempts: status.recent_failed_attempts,
            is_rate_limited: status.is_rate_limited,
            remaining_attempts: status.remaining_attempts,
            window_start: status.window_start,
            resets_at: status.resets_at,
        }
    }
}

/// A user with claim history and attempts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetail {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub total_points: i64,
    pub history: Vec<HistoryEntryResponse>,
    pub claim_attempts: Vec<ClaimAttemptResponse>,
    pub rate_limit: RateLimitResponse,
}

/// Response for `GET /api/users/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDetailResponse {
    pub success: bool,
    pub user: UserDetail,
}

// ============================================================================
// Claims
// ============================================================================

/// Request to redeem a hunt item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimRequest {
    pub identifier: String,
}

/// A successful redemption.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub success: bool,
    pub hunt_item: HuntItemResponse,
    pub points_awarded: i64,
    pub rate_limit: RateLimitResponse,
}

// ============================================================================
// Audit
// ============================================================================

/// Query parameters for the audit log.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    /// Maximum records returned (default 50, at most 500).
    pub limit: Option<u32>,
    /// Only records that targeted this user email.
    pub user: Option<String>,
}

/// An admin audit record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub action: String,
    pub actor: String,
    #[serde(default)]
    pub target_user: Option<String>,
    #[serde(default)]
    pub resource_id: Option<Uuid>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub after: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl From<AdminAuditRecord> for AuditLogResponse {
    fn from(record: AdminAuditRecord) -> Self {
        Self {
            id: record.id,
            action: record.action.as_str().to_string(),
            actor: record.actor,
            target_user: record.target_user,
            resource_id: record.resource_id,
            before: record.before,
            after: record.after,
            timestamp: record.timestamp,
        }
    }
}

/// Audit records, newest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogsResponse {
    pub success: bool,
    pub audit_logs: Vec<AuditLogResponse>,
}
