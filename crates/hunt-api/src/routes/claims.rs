//! Claim redemption route, where the failed-claim rate limit is enforced.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use hunt_core::{
    db::{create_hunt_item_repository, create_user_repository},
    RedemptionService, ServiceError,
};
use hunt_observability::metrics::record_claim_attempt;

use crate::auth::AuthenticatedUser;
use crate::dto::{ApiJson, ClaimRequest, ClaimResponse, HuntItemResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates the claim routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(claim_hunt_item))
}

/// Redeems a hunt item by its claim code.
///
/// Unknown codes and items already claimed count as failed attempts.
#[utoipa::path(
    post,
    path = "/api/claims",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Item claimed", body = ClaimResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Unknown claim code", body = ErrorResponse),
        (status = 409, description = "Item already claimed", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse)
    ),
    tag = "Claims"
)]
pub async fn claim_hunt_item(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(request): ApiJson<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let users = create_user_repository(&state.db);
    let items = create_hunt_item_repository(&state.db);
    let service = RedemptionService::new(users.as_ref(), items.as_ref(), state.rate_limit);

    let result = service.claim(user.id, &request.identifier, Utc::now()).await;
    match &result {
        Ok(_) => record_claim_attempt("success"),
        Err(ServiceError::RateLimited { .. }) => record_claim_attempt("rate_limited"),
        Err(ServiceError::NotFound { .. }) | Err(ServiceError::Conflict(_)) => {
            record_claim_attempt("failed")
        }
        Err(_) => {}
    }
    let outcome = result?;

    Ok(Json(ClaimResponse {
        success: true,
        hunt_item: HuntItemResponse::public(outcome.item),
        points_awarded: outcome.points_awarded,
        rate_limit: outcome.rate_limit.into(),
    }))
}
