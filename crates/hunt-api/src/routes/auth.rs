//! Session login, logout and current-user routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use hunt_core::{db::create_user_repository, verify_password, SessionData};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::auth::{clear_session, set_session_data, AuthenticatedUser};
use crate::dto::{ApiJson, CurrentUserResponse, LoginRequest, SuccessResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Signs in with email and password and starts a session.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = CurrentUserResponse),
        (status = 401, description = "Invalid credentials or disabled account", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user_repo = create_user_repository(&state.db);
    let Some(user) = user_repo.get_by_email(&request.email).await? else {
        warn!(email = %request.email, "Login attempt for unknown user");
        return Err(ApiError::InvalidCredentials);
    };

    if !user.enabled {
        warn!(email = %user.email, "Login attempt for disabled account");
        return Err(ApiError::AccountDisabled);
    }

    match verify_password(&request.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(email = %user.email, "Invalid password");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "Password verification failed: {}",
                e
            )));
        }
    }

    // New id after authentication so a pre-login session id cannot be reused.
    if let Err(e) = session.cycle_id().await {
        warn!(error = %e, "Failed to regenerate session ID");
    }

    set_session_data(&session, SessionData::new(&user))
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store session: {}", e)))?;

    info!(email = %user.email, role = %user.role, "User logged in");

    Ok(Json(CurrentUserResponse {
        success: true,
        user: (&user).into(),
    }))
}

/// Ends the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Signed out", body = SuccessResponse)),
    tag = "Auth"
)]
pub async fn logout(session: Session) -> Json<SuccessResponse> {
    if let Err(e) = clear_session(&session).await {
        warn!(error = %e, "Error clearing session during logout");
    }

    info!("User logged out");

    Json(SuccessResponse::ok())
}

/// Returns the signed-in account.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: true,
        user: (&user).into(),
    })
}
