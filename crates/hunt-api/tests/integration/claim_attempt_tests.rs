//! Claim redemption, attempt monitoring and rate-limit resets end to end.

use axum::http::{Method, StatusCode};
use hunt_core::Role;
use serde_json::json;

use super::common::{create_account, create_test_router, login, send};

#[tokio::test]
async fn test_rate_limited_player_is_unblocked_by_admin_clear() {
    let (app, state) = create_test_router().await;
    create_account(&state, "admin@example.com", Role::Admin).await;
    let player = create_account(&state, "player+hunt@example.com", Role::Player).await;
    let admin_cookie = login(&app, "admin@example.com").await;
    let player_cookie = login(&app, "player+hunt@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/hunt-items",
        Some(&admin_cookie),
        Some(json!({
            "name": "Bell",
            "description": "",
            "identifier": "BELL-3",
            "points": 15
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for _ in 0..10 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/claims",
            Some(&player_cookie),
            Some(json!({ "identifier": "WRONG" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/claims",
        Some(&player_cookie),
        Some(json!({ "identifier": "BELL-3" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["retryAfterSeconds"].as_u64().unwrap() > 0);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/users/{}", player.id),
        Some(&player_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["rate_limit"]["isRateLimited"], true);
    assert_eq!(body["user"]["rate_limit"]["remainingAttempts"], 0);

    let query = serde_urlencoded::to_string([
        ("email", "player+hunt@example.com"),
        ("failed", "true"),
    ])
    .unwrap();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/admin/claim-attempts?{}", query),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["failed"], 10);
    assert_eq!(body["stats"]["uniqueUsers"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/claim-attempts",
        Some(&admin_cookie),
        Some(json!({ "userEmail": "player+hunt@example.com", "clearType": "rate-limit" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 10);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/claims",
        Some(&player_cookie),
        Some(json!({ "identifier": "BELL-3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pointsAwarded"], 15);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/users/{}", player.id),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(body["user"]["history"][0]["itemName"], "Bell");
    assert_eq!(body["user"]["total_points"], 15);
}

#[tokio::test]
async fn test_invalid_clear_type_is_bad_request() {
    let (app, state) = create_test_router().await;
    create_account(&state, "admin@example.com", Role::Admin).await;
    let cookie = login(&app, "admin@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/claim-attempts",
        Some(&cookie),
        Some(json!({ "userEmail": "admin@example.com", "clearType": "everything" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_players_cannot_read_other_users() {
    let (app, state) = create_test_router().await;
    create_account(&state, "one@example.com", Role::Player).await;
    let other = create_account(&state, "two@example.com", Role::Player).await;
    let cookie = login(&app, "one@example.com").await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/users/{}", other.id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
