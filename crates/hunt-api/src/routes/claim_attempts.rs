//! Admin claim-attempt monitoring and clearing.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use hunt_core::{
    db::{create_audit_repository, create_user_repository},
    ClaimAttemptQuery, ClaimAttemptService, ClearPolicy, ServiceError,
};
use hunt_observability::metrics::record_claim_attempt_clear;

use crate::auth::RequireAdmin;
use crate::dto::{
    ApiJson, ApiQuery, ClaimAttemptsResponse, ClearClaimAttemptsRequest,
    ClearClaimAttemptsResponse, ListClaimAttemptsQuery,
};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates the claim-attempt routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_claim_attempts).post(clear_claim_attempts))
}

impl ListClaimAttemptsQuery {
    fn into_query(self) -> Result<ClaimAttemptQuery, ApiError> {
        let email = self.email.filter(|e| !e.trim().is_empty());
        let failed_only = matches!(
            self.failed.as_deref().map(str::trim),
            Some("true") | Some("1")
        );
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                ApiError::BadRequest(format!("Invalid limit '{}'", raw))
            })?),
        };

        Ok(ClaimAttemptQuery {
            email,
            failed_only,
            limit,
        })
    }
}

/// Lists claim attempts across users, newest first.
///
/// Stats cover every matching attempt, not just the returned page.
#[utoipa::path(
    get,
    path = "/api/admin/claim-attempts",
    params(ListClaimAttemptsQuery),
    responses(
        (status = 200, description = "Claim attempts and stats", body = ClaimAttemptsResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Claim Attempts"
)]
pub async fn list_claim_attempts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(params): ApiQuery<ListClaimAttemptsQuery>,
) -> Result<Json<ClaimAttemptsResponse>, ApiError> {
    let query = params.into_query()?;

    let users = create_user_repository(&state.db);
    let audit = create_audit_repository(&state.db);
    let service = ClaimAttemptService::new(users.as_ref(), audit.as_ref(), state.rate_limit);
    let report = service.query(&query).await?;

    Ok(Json(ClaimAttemptsResponse {
        success: true,
        claim_attempts: report.attempts.into_iter().map(Into::into).collect(),
        stats: report.stats.into(),
    }))
}

/// Clears a user's claim attempts under `failed`, `all` or `rate-limit`.
#[utoipa::path(
    post,
    path = "/api/admin/claim-attempts",
    request_body = ClearClaimAttemptsRequest,
    responses(
        (status = 200, description = "Attempts cleared", body = ClearClaimAttemptsResponse),
        (status = 400, description = "Unknown clear type or missing email", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "No user with that email", body = ErrorResponse)
    ),
    tag = "Claim Attempts"
)]
pub async fn clear_claim_attempts(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<ClearClaimAttemptsRequest>,
) -> Result<Json<ClearClaimAttemptsResponse>, ApiError> {
    let policy: ClearPolicy = request
        .clear_type
        .parse()
        .map_err(ServiceError::from)?;

    let email = request.user_email.trim();
    if email.is_empty() {
        return Err(ApiError::BadRequest("userEmail is required".to_string()));
    }

    let users = create_user_repository(&state.db);
    let audit = create_audit_repository(&state.db);
    let service = ClaimAttemptService::new(users.as_ref(), audit.as_ref(), state.rate_limit);
    let outcome = service.clear(&admin.email, email, policy, Utc::now()).await?;

    record_claim_attempt_clear(policy.as_str(), outcome.removed);

    Ok(Json(ClearClaimAttemptsResponse {
        success: true,
        message: outcome.message,
        removed: outcome.removed,
    }))
}
