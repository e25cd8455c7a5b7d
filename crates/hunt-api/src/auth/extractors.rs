//! Axum extractors for authentication and authorization.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use hunt_core::{db::create_user_repository, User};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::get_session_data;

/// Extractor for authenticated users.
///
/// Loads the user named by the session from the database so role and
/// enabled changes apply to existing sessions. Rejects with 401 when there
/// is no session or the account is gone or disabled.
///
/// # Example
///
/// ```ignore
/// async fn protected_endpoint(
///     AuthenticatedUser(user): AuthenticatedUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // In tests, check for injected test user first
        #[cfg(test)]
        {
            if let Some(test_user) = parts.extensions.get::<super::test_helpers::TestUser>() {
                return Ok(AuthenticatedUser(test_user.0.clone()));
            }
        }

        let app_state = AppState::from_ref(state);

        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Err(ApiError::Unauthorized(
                "Authentication required".to_string(),
            ));
        };
        let Some(session_data) = get_session_data(&session).await else {
            return Err(ApiError::Unauthorized(
                "Authentication required".to_string(),
            ));
        };

        let user_repo = create_user_repository(&app_state.db);
        match user_repo.get(session_data.user_id).await? {
            Some(user) if user.enabled => Ok(AuthenticatedUser(user)),
            Some(user) => {
                warn!(user_id = %user.id, "Session belongs to a disabled account");
                Err(ApiError::AccountDisabled)
            }
            None => {
                debug!(user_id = %session_data.user_id, "Session user no longer exists");
                Err(ApiError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
        }
    }
}

/// Extractor that requires admin role.
///
/// Returns 401 without a session and 403 Forbidden if the user is not an admin.
pub struct RequireAdmin(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            warn!(
                user_id = %user.id,
                path = %parts.uri.path(),
                "Non-admin user denied admin endpoint"
            );
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user))
    }
}
