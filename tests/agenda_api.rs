//! Drives the HTTP surface of the agenda over the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use agenda_server::models::Player;
use agenda_server::routes::create_routes;
use agenda_server::state::AppState;
use agenda_server::store::MemoryStore;

const TEAM: i64 = 7;

async fn app() -> Router {
    let store = MemoryStore::new();
    for (id, name) in [(1, "Louis"), (2, "Mathieu"), (3, "Nicolas")] {
        store
            .add_player(Player {
                id,
                team_id: TEAM,
                display_name: name.to_string(),
            })
            .await;
    }
    create_routes(AppState::new(Arc::new(store)))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    player_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(player_id) = player_id {
        builder = builder
            .header("x-player-id", player_id.to_string())
            .header("x-team-id", TEAM.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create(app: &Router, body: Value) -> String {
    let (status, json) = call(app, Method::POST, "/api/events", Some(1), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["event_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check_has_security_headers() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let app = app().await;
    let (status, json) = call(&app, Method::GET, "/api/events?month=2025-03", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn test_vote_flow_confirms_event() {
    let app = app().await;
    let event_id = create(
        &app,
        json!({
            "title": "Friendly against the Barbarians",
            "category": "friendly_match",
            "scheduled_at": "2025-03-22T14:00",
            "location": "Stade municipal",
            "min_attendees": 3
        }),
    )
    .await;
    let event_uri = format!("/api/events/{event_id}");
    let vote_uri = format!("/api/events/{event_id}/availability");

    let (_, json) = call(&app, Method::GET, &event_uri, Some(2), None).await;
    assert_eq!(json["data"]["status"], "proposed");
    assert_eq!(json["data"]["category_label"], "🏉 Friendly match");
    assert_eq!(json["data"]["availabilities"][0]["player_name"], "Louis");
    assert_eq!(json["data"]["availabilities"][0]["status"], "available");

    let (status, json) = call(
        &app,
        Method::PUT,
        &vote_uri,
        Some(2),
        Some(json!({ "status": "available" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["event_status"], "proposed");

    let (_, json) = call(
        &app,
        Method::PUT,
        &vote_uri,
        Some(3),
        Some(json!({ "status": "available", "comment": "bringing boots" })),
    )
    .await;
    assert_eq!(json["data"]["event_status"], "confirmed");

    let (_, json) = call(&app, Method::GET, &vote_uri, Some(3), None).await;
    assert_eq!(
        json["data"],
        json!({ "available": 3, "maybe": 0, "unavailable": 0, "total": 3 })
    );

    let (_, json) = call(&app, Method::GET, "/api/events?month=2025-03", Some(2), None).await;
    let events = json["data"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["status"], "confirmed");
    assert_eq!(events[0]["available_count"], 3);
    assert!(events[0].get("availabilities").is_none());
}

#[tokio::test]
async fn test_invalid_vote_status_is_a_validation_error() {
    let app = app().await;
    let event_id = create(
        &app,
        json!({ "title": "Team meeting", "scheduled_at": "2025-03-10 19:00" }),
    )
    .await;

    let (status, json) = call(
        &app,
        Method::PUT,
        &format!("/api/events/{event_id}/availability"),
        Some(2),
        Some(json!({ "status": "sometimes" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_requires_title_and_date() {
    let app = app().await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/events",
        Some(1),
        Some(json!({ "scheduled_at": "2025-03-10 19:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/events",
        Some(1),
        Some(json!({ "title": "No date" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_legacy_min_players_is_clamped() {
    let app = app().await;
    let event_id = create(
        &app,
        json!({
            "title": "Viewing party",
            "type": "visionnage",
            "proposed_date": "2025-03-15 21:00",
            "min_players": 9
        }),
    )
    .await;

    let event_uri = format!("/api/events/{event_id}");
    let (_, json) = call(&app, Method::GET, &event_uri, Some(1), None).await;
    assert_eq!(json["data"]["min_attendees"], 7);
    assert_eq!(json["data"]["category"], "viewing_party");
}

#[tokio::test]
async fn test_non_creator_cannot_delete() {
    let app = app().await;
    let event_id = create(
        &app,
        json!({ "title": "Training", "scheduled_at": "2025-03-12 18:30" }),
    )
    .await;
    let event_uri = format!("/api/events/{event_id}");

    let (status, json) = call(&app, Method::DELETE, &event_uri, Some(2), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["code"], "FORBIDDEN");

    let (status, json) = call(&app, Method::GET, &event_uri, Some(2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_responses"], 1);

    let (status, _) = call(&app, Method::DELETE, &event_uri, Some(1), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, &event_uri, Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancelled_event_ignores_votes() {
    let app = app().await;
    let event_id = create(
        &app,
        json!({ "title": "Pub quiz", "scheduled_at": "2025-03-28 20:00", "min_attendees": 2 }),
    )
    .await;
    let event_uri = format!("/api/events/{event_id}");

    let (status, _) = call(
        &app,
        Method::PATCH,
        &event_uri,
        Some(1),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = call(
        &app,
        Method::PUT,
        &format!("{event_uri}/availability"),
        Some(2),
        Some(json!({ "status": "available" })),
    )
    .await;
    assert_eq!(json["data"]["event_status"], "cancelled");

    let (_, json) = call(&app, Method::GET, &event_uri, Some(1), None).await;
    assert_eq!(json["data"]["status"], "cancelled");
    assert_eq!(json["data"]["status_label"], "Cancelled");

    let (_, json) = call(&app, Method::GET, "/api/events?month=2025-03", Some(1), None).await;
    assert!(json["data"]["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_event_id_is_not_found() {
    let app = app().await;
    let (status, json) = call(&app, Method::GET, "/api/events/not-a-uuid", Some(1), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    let (status, json) = call(
        &app,
        Method::PUT,
        "/api/events/42/availability",
        Some(2),
        Some(json!({ "status": "available" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unreadable_bodies_are_validation_errors() {
    let app = app().await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/events",
        Some(1),
        Some(json!({
            "title": "Training",
            "scheduled_at": "2025-03-12 18:30",
            "min_attendees": "5"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/events")
        .header("x-player-id", "1")
        .header("x-team-id", TEAM.to_string())
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

    let (status, json) = call(
        &app,
        Method::GET,
        "/api/events?month=2025-03&month=2025-04",
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}
