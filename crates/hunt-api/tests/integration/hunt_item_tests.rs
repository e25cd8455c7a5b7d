//! Hunt item lifecycle through the HTTP API.

use axum::http::{Method, StatusCode};
use hunt_core::Role;
use serde_json::json;

use super::common::{create_account, create_test_router, login, send};

#[tokio::test]
async fn test_hunt_item_crud_lifecycle() {
    let (app, state) = create_test_router().await;
    create_account(&state, "admin@example.com", Role::Admin).await;
    let cookie = login(&app, "admin@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/hunt-items",
        Some(&cookie),
        Some(json!({
            "name": "Old Oak",
            "description": "The tree behind the library",
            "identifier": "OAK-7",
            "points": 20
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["huntItem"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/hunt-items",
        Some(&cookie),
        Some(json!({
            "name": "Fountain",
            "description": "",
            "identifier": "FOUNTAIN-1",
            "points": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["huntItem"]["identifier"], "FOUNTAIN-1");

    let (status, body) = send(&app, Method::GET, "/api/hunt-items", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["huntItems"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Fountain");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/hunt-items/{}", id),
        Some(&cookie),
        Some(json!({ "name": "Ancient Oak", "points": 25 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["huntItem"]["name"], "Ancient Oak");
    assert_eq!(body["huntItem"]["identifier"], "OAK-7");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/hunt-items/{}", id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/hunt-items", Some(&cookie), None).await;
    assert_eq!(body["huntItems"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/admin/audit-logs",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["auditLogs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions.len(), 4);
    assert!(actions.contains(&"delete_hunt_item"));
    assert!(actions.contains(&"update_hunt_item"));
}

#[tokio::test]
async fn test_duplicate_identifier_is_a_conflict() {
    let (app, state) = create_test_router().await;
    create_account(&state, "admin@example.com", Role::Admin).await;
    let cookie = login(&app, "admin@example.com").await;
    let item = json!({
        "name": "Old Oak",
        "description": "",
        "identifier": "OAK-7",
        "points": 20
    });

    let (status, _) = send(&app, Method::POST, "/api/hunt-items", Some(&cookie), Some(item.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/api/hunt-items", Some(&cookie), Some(item)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}
