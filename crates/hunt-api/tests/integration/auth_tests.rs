//! Authentication and authorization tests.
//!
//! Protected endpoints reject requests without a session with 401 and
//! admin endpoints reject players with 403.

use axum::http::{Method, StatusCode};
use hunt_core::Role;
use serde_json::json;

use super::common::{create_account, create_test_router, login, send};

#[tokio::test]
async fn test_admin_endpoints_require_session() {
    let (app, _state) = create_test_router().await;

    for (method, uri) in [
        (Method::GET, "/api/admin/claim-attempts"),
        (Method::POST, "/api/admin/claim-attempts"),
        (Method::GET, "/api/admin/audit-logs"),
        (Method::GET, "/api/v1/admin/claim-attempts"),
        (Method::POST, "/api/hunt-items"),
    ] {
        let body = (method == Method::POST).then(|| json!({}));
        let (status, body) = send(&app, method.clone(), uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_player_is_forbidden_from_admin_endpoints() {
    let (app, state) = create_test_router().await;
    create_account(&state, "player@example.com", Role::Player).await;
    let cookie = login(&app, "player@example.com").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/admin/claim-attempts",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("claimAttempts").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/claim-attempts",
        Some(&cookie),
        Some(json!({ "userEmail": "player@example.com", "clearType": "all" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_me_logout() {
    let (app, state) = create_test_router().await;
    create_account(&state, "admin@example.com", Role::Admin).await;
    let cookie = login(&app, "ADMIN@example.com").await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["role"], "admin");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, state) = create_test_router().await;
    create_account(&state, "admin@example.com", Role::Admin).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _state) = create_test_router().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["connected"], true);
}
