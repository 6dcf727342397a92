// Copyright 2026 Reelfeed Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for Reelfeed.
//!
//! Thin transport over [`FeedService`]. Response shapes for `/reels`,
//! `/refresh` and `/health` match what the watch client decodes.

use crate::model::Item;
use crate::service::FeedService;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Build the axum Router with all REST endpoints.
pub fn router(service: Arc<FeedService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/reels", get(reels))
        .route("/refresh", post(refresh))
        .route("/api/v1/status", get(status))
        .layer(cors)
        .with_state(service)
}

/// Serve the REST API until the process is asked to stop.
pub async fn serve(addr: &str, service: Arc<FeedService>) -> anyhow::Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("REST API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
        })
        .await?;
    Ok(())
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ReelsParams {
    /// Kept as text so junk like `?limit=abc` falls back to the default.
    limit: Option<String>,
}

/// Body of `GET /reels`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReelsResponse {
    pub reels: Vec<Item>,
    pub metadata: ReelsMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelsMetadata {
    pub total: usize,
    pub scraped_at: DateTime<Utc>,
    pub source: String,
}

/// Leading decimal digits of the query value, so `7abc` reads as 7.
fn parse_limit(raw: Option<&str>) -> Option<usize> {
    let s = raw?.trim_start();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

// ── Handlers ────────────────────────────────────────────────────

async fn health(State(service): State<Arc<FeedService>>) -> Json<Value> {
    let health = service.health_status();
    Json(serde_json::json!({
        "status": health.status,
        "timestamp": health.timestamp,
        "usingSyntheticData": health.using_synthetic_data,
        "mockData": health.using_synthetic_data,
        "source": service.config().source_tag,
    }))
}

async fn reels(
    State(service): State<Arc<FeedService>>,
    Query(params): Query<ReelsParams>,
) -> Json<ReelsResponse> {
    let batch = service
        .request_items(parse_limit(params.limit.as_deref()))
        .await;

    Json(ReelsResponse {
        metadata: ReelsMetadata {
            total: batch.count,
            scraped_at: batch.generated_at,
            source: batch.source_tag,
        },
        reels: batch.items,
    })
}

async fn refresh(State(service): State<Arc<FeedService>>) -> Json<Value> {
    let report = service.force_refresh().await;
    Json(serde_json::json!({
        "success": report.accepted,
        "accepted": report.accepted,
        "count": report.item_count,
        "message": format!("Refreshed {} items", report.item_count),
        "timestamp": report.generated_at,
    }))
}

async fn status(State(service): State<Arc<FeedService>>) -> Json<Value> {
    Json(serde_json::json!({
        "running": true,
        "queue": service.queue_status(),
        "synthetic": service.config().use_synthetic_data,
    }))
}
