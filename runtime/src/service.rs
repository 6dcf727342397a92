// Copyright 2026 Reelfeed Contributors
// SPDX-License-Identifier: Apache-2.0

//! Caller-facing feed operations.
//!
//! Every operation here is total: acquisition failures of any kind are
//! absorbed and answered with a synthetic batch.

use crate::acquisition::fallback::{FallbackSynthesizer, FALLBACK_SOURCE_TAG};
use crate::acquisition::queue::AcquisitionQueue;
use crate::model::Item;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Descriptive tag for real batches. Opaque to every consumer.
pub const DEFAULT_SOURCE_TAG: &str = "instagram-reels";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Serve synthetic items without ever launching a browser.
    pub use_synthetic_data: bool,
    pub source_tag: String,
    /// Used when the caller gives no (or a zero) limit.
    pub default_limit: usize,
    /// Upper clamp on any requested limit.
    pub max_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            use_synthetic_data: false,
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Result of `request_items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedBatch {
    pub items: Vec<Item>,
    pub count: usize,
    pub generated_at: DateTime<Utc>,
    pub source_tag: String,
}

impl FeedBatch {
    fn new(items: Vec<Item>, source_tag: &str) -> Self {
        Self {
            count: items.len(),
            items,
            generated_at: Utc::now(),
            source_tag: source_tag.to_string(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source_tag == FALLBACK_SOURCE_TAG
    }
}

/// Result of `force_refresh`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub accepted: bool,
    pub item_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Result of `health_status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub using_synthetic_data: bool,
    pub timestamp: DateTime<Utc>,
}

/// Queue depth and uptime for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub busy: bool,
    pub pending_jobs: usize,
    pub uptime_seconds: f64,
    pub version: &'static str,
}

pub struct FeedService {
    queue: AcquisitionQueue,
    fallback: FallbackSynthesizer,
    config: ServiceConfig,
    started_at: Instant,
}

impl FeedService {
    pub fn new(queue: AcquisitionQueue, fallback: FallbackSynthesizer, config: ServiceConfig) -> Self {
        Self {
            queue,
            fallback,
            config,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Clamp a caller limit into `[1, max_limit]`, defaulting absent or zero.
    pub fn effective_limit(&self, limit: Option<usize>) -> usize {
        match limit {
            Some(n) if n > 0 => n.min(self.config.max_limit.max(1)),
            _ => self.config.default_limit.clamp(1, self.config.max_limit.max(1)),
        }
    }

    /// Up to `limit` items, real when possible, synthetic otherwise.
    pub async fn request_items(&self, limit: Option<usize>) -> FeedBatch {
        let limit = self.effective_limit(limit);

        if self.config.use_synthetic_data {
            info!(limit, "serving synthetic items");
            return self.synthetic_batch(limit);
        }

        match self.queue.submit(limit).await {
            Ok(mut items) if !items.is_empty() => {
                items.truncate(limit);
                info!(returned = items.len(), limit, "serving acquired items");
                FeedBatch::new(items, &self.config.source_tag)
            }
            Ok(_) => {
                warn!(limit, "acquisition returned nothing; serving fallback");
                self.synthetic_batch(limit)
            }
            Err(e) => {
                warn!(limit, kind = e.kind(), error = %e, "acquisition failed; serving fallback");
                self.synthetic_batch(limit)
            }
        }
    }

    /// Run a fresh default-size acquisition and report how many items it produced.
    pub async fn force_refresh(&self) -> RefreshReport {
        let limit = self.effective_limit(None);

        let item_count = if self.config.use_synthetic_data {
            limit
        } else {
            match self.queue.submit(limit).await {
                Ok(items) if !items.is_empty() => items.len(),
                Ok(_) => {
                    warn!("refresh produced nothing; reporting synthetic count");
                    limit
                }
                Err(e) => {
                    warn!(kind = e.kind(), error = %e, "refresh failed; reporting synthetic count");
                    limit
                }
            }
        };

        RefreshReport {
            accepted: true,
            item_count,
            generated_at: Utc::now(),
        }
    }

    /// Process-wide configuration, not pipeline health.
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy",
            using_synthetic_data: self.config.use_synthetic_data,
            timestamp: Utc::now(),
        }
    }

    pub fn queue_status(&self) -> QueueStatus {
        QueueStatus {
            busy: self.queue.is_busy(),
            pending_jobs: self.queue.pending(),
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn synthetic_batch(&self, limit: usize) -> FeedBatch {
        FeedBatch::new(self.fallback.generate(limit), FALLBACK_SOURCE_TAG)
    }
}
