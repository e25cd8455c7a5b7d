//! API routes.

pub mod audit;
pub mod auth;
pub mod claim_attempts;
pub mod claims;
pub mod health;
pub mod hunt_items;
pub mod metrics;
pub mod users;

use crate::state::AppState;
use axum::Router;
use tower_sessions::{cookie::time::Duration, Expiry, MemoryStore, SessionManagerLayer};

/// Idle time after which a session expires.
const SESSION_IDLE_HOURS: i64 = 8;

/// Creates the main API router, including the session layer.
pub fn create_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_IDLE_HOURS)));

    Router::new()
        .nest("/api/v1", api_routes())
        .nest("/api", api_routes())
        .nest("/auth", auth::routes())
        .merge(health::routes())
        .merge(metrics::routes())
        .with_state(state)
        .layer(session_layer)
}

/// API routes under the /api prefix.
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/hunt-items", hunt_items::routes())
        .nest("/admin/claim-attempts", claim_attempts::routes())
        .nest("/admin/audit-logs", audit::routes())
        .nest("/users", users::routes())
        .nest("/claims", claims::routes())
}
