//! Common test utilities for integration tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use hunt_api::{routes, state::AppState};
use hunt_core::db::{create_user_repository, run_migrations, DbPool};
use hunt_core::{hash_password, Role, User};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Password shared by every seeded account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Creates an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> DbPool {
    let db_url = format!(
        "sqlite:file:integration_test_{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .expect("Failed to create SQLite pool");

    let pool = DbPool::Sqlite(pool);
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Creates the full router and its state.
pub async fn create_test_router() -> (Router, AppState) {
    let state = AppState::new(setup_test_db().await);
    (routes::create_router(state.clone()), state)
}

/// Inserts an account that can log in with [`TEST_PASSWORD`].
pub async fn create_account(state: &AppState, email: &str, role: Role) -> User {
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let user = User::new(email, "Test Account", hash, role);
    create_user_repository(&state.db)
        .create(&user)
        .await
        .expect("Failed to create user")
}

/// Logs in and returns the session cookie to replay.
pub async fn login(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/auth/login",
            None,
            Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK, "login failed for {}", email);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login did not set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Builds a JSON request, optionally carrying a session cookie.
pub fn json_request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends a request and decodes the JSON response body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(method, uri, cookie, body))
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };
    (status, json)
}
