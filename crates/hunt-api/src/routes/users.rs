//! User detail route.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use hunt_core::db::create_user_repository;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::dto::{UserDetail, UserDetailResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_user))
}

/// Gets a user with claim history, attempts and current rate-limit state.
///
/// Admins may read any user; players only themselves.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User detail", body = UserDetailResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not allowed to read this user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    if !caller.is_admin() && caller.id != id {
        warn!(caller = %caller.id, target = %id, "User detail denied");
        return Err(ApiError::Forbidden(
            "You may only view your own account".to_string(),
        ));
    }

    let profile = create_user_repository(&state.db)
        .get_profile(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;

    let rate_limit = state.rate_limit.evaluate(&profile.claim_attempts, Utc::now());
    let total_points = profile.total_points();
    let user = profile.user;

    Ok(Json(UserDetailResponse {
        success: true,
        user: UserDetail {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.as_str().to_string(),
            total_points,
            history: profile.history.into_iter().map(Into::into).collect(),
            claim_attempts: profile.claim_attempts.into_iter().map(Into::into).collect(),
            rate_limit: rate_limit.into(),
        },
    }))
}
