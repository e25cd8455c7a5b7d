//! Session authentication and role checks for the API.

pub mod extractors;
#[cfg(test)]
pub mod test_helpers;

pub use extractors::{AuthenticatedUser, RequireAdmin};

use hunt_core::SessionData;
use tower_sessions::Session;

/// Session key for storing user data.
pub const SESSION_USER_KEY: &str = "user";

/// Gets the session data from the session.
pub async fn get_session_data(session: &Session) -> Option<SessionData> {
    session
        .get::<SessionData>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
}

/// Stores session data in the session.
pub async fn set_session_data(
    session: &Session,
    data: SessionData,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(SESSION_USER_KEY, data).await
}

/// Clears the session (logout).
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
