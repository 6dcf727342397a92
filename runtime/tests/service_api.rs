//! Caller-facing operations: request_items, force_refresh, health and the
//! REST surface on top of them.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use reelfeed_runtime::acquisition::fallback::FALLBACK_SOURCE_TAG;
use reelfeed_runtime::model::is_valid_id;
use reelfeed_runtime::rest::{self, ReelsResponse};
use reelfeed_runtime::service::{ServiceConfig, DEFAULT_SOURCE_TAG};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

// ── request_items ──

#[tokio::test]
async fn test_session_failure_serves_synthetic_batch() {
    let (renderer, script) = ScriptBuilder::default().fail_launch().build();
    let service = service(renderer, ServiceConfig::default());

    let batch = service.request_items(Some(5)).await;

    assert_eq!(batch.count, 5);
    assert_eq!(batch.items.len(), 5);
    assert!(batch.is_synthetic());
    assert_eq!(batch.source_tag, FALLBACK_SOURCE_TAG);
    assert!(batch.items.iter().all(|i| i.is_playable() && is_valid_id(&i.id)));
    assert_eq!(script.launched(), 0);
}

#[tokio::test]
async fn test_real_batch_carries_source_tag() {
    let (renderer, _script) = ScriptBuilder::default()
        .primary(listing(&["aaaaaa11", "bbbbbb22"]))
        .playable("aaaaaa11")
        .playable("bbbbbb22")
        .build();
    let service = service(renderer, ServiceConfig::default());

    let batch = service.request_items(Some(5)).await;

    assert_eq!(ids(&batch.items), ["aaaaaa11", "bbbbbb22"]);
    assert_eq!(batch.count, 2);
    assert_eq!(batch.source_tag, DEFAULT_SOURCE_TAG);
    assert!(!batch.is_synthetic());
}

#[tokio::test]
async fn test_nothing_playable_falls_back_to_exact_count() {
    let (renderer, _script) = ScriptBuilder::default()
        .primary(listing(&["aaaaaa11"]))
        .unplayable("aaaaaa11")
        .build();
    let service = service(renderer, ServiceConfig::default());

    let batch = service.request_items(Some(7)).await;

    assert!(batch.is_synthetic());
    assert_eq!(batch.count, 7);
}

#[tokio::test]
async fn test_synthetic_mode_never_launches() {
    let (renderer, script) = three_listing().build();
    let service = service(renderer, synthetic_config());

    for n in [1, 5, 7, 50] {
        let batch = service.request_items(Some(n)).await;
        assert_eq!(batch.count, n);
        assert!(batch.is_synthetic());
    }
    assert_eq!(script.launched(), 0);
}

#[tokio::test]
async fn test_limit_defaults_and_clamps() {
    let (renderer, _script) = ScriptBuilder::default().build();
    let service = service(renderer, synthetic_config());

    assert_eq!(service.request_items(None).await.count, 10);
    assert_eq!(service.request_items(Some(0)).await.count, 10);
    assert_eq!(service.request_items(Some(500)).await.count, 50);
    assert_eq!(service.effective_limit(Some(3)), 3);
}

// ── force_refresh / health ──

#[tokio::test]
async fn test_force_refresh_reports_acquired_count() {
    let (renderer, script) = three_listing().build();
    let service = service(renderer, ServiceConfig::default());

    let report = service.force_refresh().await;

    assert!(report.accepted);
    assert_eq!(report.item_count, 3);
    assert_eq!(script.launched(), 1);
}

#[tokio::test]
async fn test_force_refresh_in_synthetic_mode() {
    let (renderer, script) = three_listing().build();
    let service = service(renderer, synthetic_config());

    let report = service.force_refresh().await;

    assert!(report.accepted);
    assert_eq!(report.item_count, 10);
    assert_eq!(script.launched(), 0);
}

#[tokio::test]
async fn test_health_reflects_configuration() {
    let (renderer, _script) = ScriptBuilder::default().build();
    let service = service(renderer, synthetic_config());

    let health = service.health_status();
    assert_eq!(health.status, "healthy");
    assert!(health.using_synthetic_data);

    let status = service.queue_status();
    assert!(!status.busy);
    assert_eq!(status.pending_jobs, 0);
}

// ── REST ──

async fn get_json(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_rest_health() {
    let (renderer, _script) = ScriptBuilder::default().build();
    let app = rest::router(Arc::new(service(renderer, synthetic_config())));

    let (status, body) = get_json(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["usingSyntheticData"], true);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_rest_reels_wire_shape() {
    let (renderer, _script) = ScriptBuilder::default().build();
    let app = rest::router(Arc::new(service(renderer, synthetic_config())));

    let (status, body) = get_json(app, get("/reels?limit=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["total"], 3);
    assert_eq!(body["metadata"]["source"], FALLBACK_SOURCE_TAG);
    assert!(body["metadata"]["scrapedAt"].is_string());

    let first = &body["reels"][0];
    assert_eq!(first["type"], "short");
    assert!(first["videoId"].is_string());
    assert!(first["videoUrl"].as_str().unwrap().ends_with(".mp4"));
    assert!(first["link"].as_str().unwrap().starts_with("https://"));

    let parsed: ReelsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.reels.len(), 3);
}

#[tokio::test]
async fn test_rest_reels_bad_limit_uses_default() {
    let (renderer, _script) = ScriptBuilder::default().build();
    let app = rest::router(Arc::new(service(renderer, synthetic_config())));

    let (_, body) = get_json(app, get("/reels?limit=abc")).await;
    assert_eq!(body["metadata"]["total"], 10);
}

#[tokio::test]
async fn test_rest_refresh_and_status() {
    let (renderer, _script) = ScriptBuilder::default().build();
    let app = rest::router(Arc::new(service(renderer, synthetic_config())));

    let req = Request::builder()
        .method("POST")
        .uri("/refresh")
        .body(Body::empty())
        .unwrap();
    let (status, body) = get_json(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 10);

    let (status, body) = get_json(app, get("/api/v1/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running"], true);
    assert_eq!(body["queue"]["pendingJobs"], 0);
}

// ── helpers ──

fn three_listing() -> ScriptBuilder {
    ScriptBuilder::default()
        .primary(listing(&["aaaaaa11", "bbbbbb22", "cccccc33"]))
        .playable("aaaaaa11")
        .playable("bbbbbb22")
        .playable("cccccc33")
}
