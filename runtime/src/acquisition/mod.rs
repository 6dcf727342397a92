//! Browser-driven acquisition engine.
//!
//! A single queue worker drives one browser session through two listing
//! surfaces, resolves media per candidate, and falls back to a synthetic
//! catalog when nothing playable comes back.

pub mod diagnostics;
pub mod extractor;
pub mod fallback;
pub mod pipeline;
pub mod queue;
pub mod resolver;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// One upstream listing page scanned for candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Short label used in logs and errors.
    pub name: String,
    pub url: String,
}

impl Surface {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The main shorts feed.
    pub fn primary_feed() -> Self {
        Self::new("primary", "https://www.youtube.com/shorts/")
    }

    /// The trending shorts chart.
    pub fn trending() -> Self {
        Self::new(
            "trending",
            "https://www.youtube.com/feed/trending?bp=4gINGgt2dG1hX2NoYXJ0cw%3D%3D",
        )
    }
}

/// Run one browser step under a hard time bound.
pub(crate) async fn bounded<T>(
    limit: Duration,
    what: &str,
    step: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, step).await {
        Ok(result) => result,
        Err(_) => bail!("{what} timed out after {}ms", limit.as_millis()),
    }
}

/// Sleep unless the delay is zero.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Keep only absolute http(s) URLs; `blob:` and `data:` sources are not playable
/// outside the page that created them.
pub(crate) fn playable_url(raw: &str, base: &url::Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
