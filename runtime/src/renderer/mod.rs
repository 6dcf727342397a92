//! Renderer abstraction for browser-driven page loading.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). A renderer
//! launches one whole browser per session; the session owns the context
//! until it is closed.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Mobile Safari user-agent. The feed serves materially different markup
/// to mobile clients.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Mobile/15E148 Safari/604.1";

/// Form factor the browser pretends to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
    pub user_agent: String,
}

impl DeviceProfile {
    /// Small phone viewport (375x812 @2x) with touch.
    pub fn mobile() -> Self {
        Self {
            width: 375,
            height: 812,
            device_scale_factor: 2.0,
            is_mobile: true,
            has_touch: true,
            user_agent: MOBILE_USER_AGENT.to_string(),
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::mobile()
    }
}

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can launch isolated sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Launch a fresh browser with one page configured for `profile`.
    async fn launch(&self, profile: &DeviceProfile) -> Result<Box<dyn RenderContext>>;
    /// Engine name for logs and the doctor command.
    fn name(&self) -> &'static str;
}

/// A single live page inside a launched browser.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL and wait for the network to settle, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Scroll down by one viewport height.
    async fn scroll_viewport(&self) -> Result<()> {
        self.execute_js("window.scrollBy(0, window.innerHeight); window.scrollY")
            .await
            .map(|_| ())
    }
    /// Get the full rendered HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Capture the visible viewport as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;
    /// Close the page and tear down the browser behind it.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A renderer used when Chromium is unavailable.
///
/// Every launch fails, so each run degrades straight to the synthetic
/// fallback while the HTTP surface keeps serving.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn launch(&self, _profile: &DeviceProfile) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available"))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
