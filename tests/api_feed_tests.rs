// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP API tests driven through the router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use devquest_feed::config::Config;
use devquest_feed::db::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_app, level_up, wait_for_feed};

fn store() -> MemoryStore {
    MemoryStore::with_activities([
        level_up("1", "alice", "2024-03-01T09:00:00Z"),
        level_up("2", "bob", "2024-03-01T10:00:00Z"),
    ])
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app(MemoryStore::new(), Config::test_default());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    assert_eq!(body_json(response).await["status"], "ok");

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = create_test_app(MemoryStore::new(), Config::test_default());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "No route for /api/nope");

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_get_feed() {
    let app = create_test_app(store(), Config::test_default());
    wait_for_feed(&app.state.feed, |s| s.activity_count == 2).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/feed").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["type"], "date-separator");
    assert_eq!(items[1]["type"], "single");
    assert_eq!(items[1]["activity"]["id"], "2");
    assert_eq!(items[1]["activity"]["createdAt"], "2024-03-01T10:00:00Z");
    assert_eq!(body["has_more"], true);
    assert_eq!(body["loading"], false);
    assert_eq!(body["viewer_id"], Value::Null);

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_load_more_reports_outcome() {
    let app = create_test_app(store(), Config::test_default());
    wait_for_feed(&app.state.feed, |s| s.activity_count == 2).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feed/load-more")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["outcome"], "started");

    // Both activities were already in the realtime window; history adds
    // nothing new and the short page ends pagination.
    let snapshot = wait_for_feed(&app.state.feed, |s| !s.loading && !s.has_more).await;
    assert_eq!(snapshot.activity_count, 2);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feed/load-more")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["outcome"], "exhausted");

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_put_filters() {
    let app = create_test_app(store(), Config::test_default());

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/feed/filters",
            json!({ "show_only_mine": true, "hide_bots": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["show_only_mine"], true);
    assert_eq!(body["hide_bots"], true);

    let snapshot = app.state.feed.snapshot();
    assert!(snapshot.filters.show_only_mine);
    assert!(snapshot.filters.hide_bots);

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_put_viewer() {
    let app = create_test_app(store(), Config::test_default());

    let response = app
        .router
        .clone()
        .oneshot(json_request("PUT", "/api/viewer", json!({ "viewer_id": " alice " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["viewer_id"], "alice");

    let snapshot =
        wait_for_feed(&app.state.feed, |s| s.viewer_id.as_deref() == Some("alice")).await;
    assert_eq!(snapshot.viewer_id.as_deref(), Some("alice"));

    let response = app
        .router
        .clone()
        .oneshot(json_request("PUT", "/api/viewer", json!({ "viewer_id": null })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.state.viewer_tx.borrow().is_none());

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_put_viewer_rejects_blank_id() {
    let app = create_test_app(store(), Config::test_default());

    let response = app
        .router
        .clone()
        .oneshot(json_request("PUT", "/api/viewer", json!({ "viewer_id": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
    assert!(app.state.viewer_tx.borrow().is_none());

    app.controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_load_more_after_shutdown_is_unavailable() {
    let app = create_test_app(store(), Config::test_default());
    let router = app.router.clone();
    app.controller.shutdown().await.unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feed/load-more")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
