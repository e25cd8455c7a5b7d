//! Shared test helpers for the hunt-api crate.
//!
//! ```ignore
//! let state = create_test_state().await;
//! let admin = seed_user(&state, "admin@example.com", Role::Admin).await;
//! let app = with_user(Router::new().nest("/hunt-items", routes()), state, admin);
//! ```

use axum::{
    body::Body,
    http::{Method, Request},
    middleware,
    response::Response,
    Router,
};
use hunt_core::db::{create_hunt_item_repository, create_user_repository, run_migrations, DbPool};
use hunt_core::{HuntItem, Role, User};
use uuid::Uuid;

use crate::auth::test_helpers::{inject_test_user, TestUser};
use crate::state::AppState;

/// Creates an isolated, migrated in-memory SQLite pool.
pub async fn setup_test_db() -> DbPool {
    let db_url = format!(
        "sqlite:file:test_api_{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .expect("Failed to create SQLite pool");

    let pool = DbPool::Sqlite(pool);
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Creates an AppState backed by a fresh test database.
pub async fn create_test_state() -> AppState {
    AppState::new(setup_test_db().await)
}

/// Inserts a user with an unusable password hash.
pub async fn seed_user(state: &AppState, email: &str, role: Role) -> User {
    let user = User::new(email, email.split('@').next().unwrap_or(email), "not_used", role);
    create_user_repository(&state.db)
        .create(&user)
        .await
        .expect("Failed to create user")
}

/// Inserts a hunt item.
pub async fn seed_item(state: &AppState, name: &str, identifier: &str, points: i64) -> HuntItem {
    let item = HuntItem::new(name, format!("{} description", name), identifier, points);
    create_hunt_item_repository(&state.db)
        .create(&item)
        .await
        .expect("Failed to create hunt item")
}

/// Binds `router` to `state` with `user` injected into every request.
pub fn with_user(router: Router<AppState>, state: AppState, user: User) -> Router {
    router
        .with_state(state)
        .layer(middleware::from_fn_with_state(TestUser(user), inject_test_user))
}

/// Builds a request with an optional JSON body.
pub fn json_request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
