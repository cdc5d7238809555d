mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{ScriptedBackend, abc_catalog, wait_for_state};
use pmoplayer::{PlaybackState, PlayerHandle, PlayerOptions, PlayerServerExt, PlayerService};
use pmoserver::ServerBuilder;
use pmostations::Station;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup() -> (PlayerHandle, Router, Vec<Station>) {
    let (catalog, stations) = abc_catalog().await;
    let (handle, _task) = PlayerService::spawn(
        catalog,
        Arc::new(ScriptedBackend::new()),
        PlayerOptions::default(),
    )
    .await
    .unwrap();

    let mut server = ServerBuilder::new("Test", "localhost", 0).build();
    server.register_player_api(handle.clone()).await;
    (handle, server.router().await, stations)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_get_session() {
    let (_handle, router, stations) = setup().await;

    let request = Request::get("/api/player").body(Body::empty()).unwrap();
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stations"].as_array().unwrap().len(), 3);
    assert_eq!(body["stations"][0]["id"], stations[0].id.as_str());
    assert!(body["selected"].is_null());
    assert_eq!(body["can_navigate"], false);
    assert_eq!(body["snapshot"]["state"], "idle");
    assert_eq!(body["snapshot"]["volume"], 70);
}

#[tokio::test]
async fn test_select_and_navigate() {
    let (handle, router, stations) = setup().await;

    let uri = format!("/api/player/select/{}", stations[2].id);
    let (status, body) = send(&router, post(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"]["id"], stations[2].id.as_str());
    assert_eq!(body["can_navigate"], true);

    let (status, body) = send(&router, post("/api/player/next")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"]["id"], stations[0].id.as_str());

    let (_, body) = send(&router, post("/api/player/previous")).await;
    assert_eq!(body["selected"]["id"], stations[2].id.as_str());

    wait_for_state(&handle, PlaybackState::Playing).await;
    let (_, body) = send(&router, post("/api/player/toggle")).await;
    assert_eq!(body["selected"]["id"], stations[2].id.as_str());
    wait_for_state(&handle, PlaybackState::Paused).await;
}

#[tokio::test]
async fn test_select_unknown_station_returns_404() {
    let (_handle, router, _stations) = setup().await;

    let (status, body) = send(&router, post("/api/player/select/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Station not found");
}

#[tokio::test]
async fn test_volume_is_clamped() {
    let (_handle, router, _stations) = setup().await;

    let request = json_request("PUT", "/api/player/volume", json!({"volume": 250}));
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot"]["volume"], 100);

    let request = json_request("PUT", "/api/player/volume", json!({"volume": "loud"}));
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remote_actions() {
    let (_handle, router, _stations) = setup().await;

    let (status, body) = send(&router, post("/api/player/remote/SeekForward")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "seekforward");
    assert_eq!(body["handled"], true);

    let (status, body) = send(&router, post("/api/player/remote/rewind")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Unknown remote action: rewind");
}

#[tokio::test]
async fn test_now_playing() {
    let (_handle, router, stations) = setup().await;

    let uri = format!("/api/player/select/{}", stations[1].id);
    send(&router, post(&uri)).await;

    let request = Request::get("/api/player/now-playing")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "B");
    assert_eq!(body["artist"], "Internet Radio");
    assert_eq!(body["album"], "Radio Player");
}

#[tokio::test]
async fn test_stream_without_relay_is_unavailable() {
    let (_handle, router, _stations) = setup().await;

    let request = Request::get("/api/player/stream").body(Body::empty()).unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "No stream is playing");
}

#[tokio::test]
async fn test_station_management() {
    let (_handle, router, stations) = setup().await;

    let request = json_request(
        "POST",
        "/api/player/stations",
        json!({"name": "Lounge", "url": "https://lounge.example/", "bitrate": "192kbps"}),
    );
    let (status, created) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["bitrate"], "192kbps");
    assert!(created["description"].is_null());

    let request = json_request(
        "POST",
        "/api/player/stations",
        json!({"name": "", "url": "not a url"}),
    );
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let uri = format!("/api/player/stations/{}", created["id"].as_str().unwrap());
    let (status, body) = send(
        &router,
        json_request("PATCH", &uri, json!({"description": "Chill"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Chill");

    let (status, _) = send(
        &router,
        json_request("PATCH", "/api/player/stations/missing", json!({"name": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Supprimer la station sélectionnée arrête la lecture
    let select = format!("/api/player/select/{}", stations[0].id);
    send(&router, post(&select)).await;
    let uri = format!("/api/player/stations/{}", stations[0].id);
    let request = Request::delete(&uri).body(Body::empty()).unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let request = Request::get("/api/player").body(Body::empty()).unwrap();
    let (_, body) = send(&router, request).await;
    assert!(body["selected"].is_null());
    assert_eq!(body["snapshot"]["state"], "idle");
    assert_eq!(body["stations"].as_array().unwrap().len(), 3);

    let request = Request::delete(&uri).body(Body::empty()).unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stopped_service_returns_503() {
    let (handle, router, _stations) = setup().await;
    handle.shutdown().await.unwrap();

    let (status, body) = send(&router, post("/api/player/play")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Player service is not running");
}
