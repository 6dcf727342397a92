//! Shared test fixtures: a scripted renderer that serves canned documents.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reelfeed_runtime::acquisition::Surface;
use reelfeed_runtime::renderer::{DeviceProfile, NavigationResult, RenderContext, Renderer};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const PRIMARY_URL: &str = "https://www.youtube.com/shorts/";
pub const TRENDING_URL: &str = "https://www.youtube.com/feed/trending?bp=4gINGgt2dG1hX2NoYXJ0cw%3D%3D";
pub const DETAIL_BASE: &str = "https://www.youtube.com/shorts/";

// ── Scripted renderer ──

/// Everything the fake records, shared between the renderer and its contexts.
#[derive(Default)]
pub struct Script {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    fail_launch: bool,
    hang_close: bool,
    hang_screenshot: bool,
    navigation_delay: Duration,

    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub launch_times: Mutex<Vec<Instant>>,
    pub navigations: Mutex<Vec<String>>,
}

impl Script {
    pub fn launched(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn visited(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn launch_gaps(&self) -> Vec<Duration> {
        let times = self.launch_times.lock().unwrap();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Builder for a [`ScriptedRenderer`].
#[derive(Default)]
pub struct ScriptBuilder {
    script: Script,
}

impl ScriptBuilder {
    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.script.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn primary(self, html: impl Into<String>) -> Self {
        self.page(PRIMARY_URL, html)
    }

    pub fn trending(self, html: impl Into<String>) -> Self {
        self.page(TRENDING_URL, html)
    }

    /// Detail page for `id` carrying a direct `<video src>`.
    pub fn playable(self, id: &str) -> Self {
        let html = format!(r#"<html><body><video src="https://cdn.test/{id}.mp4"></video></body></html>"#);
        self.page(&detail_url(id), html)
    }

    /// Detail page for `id` with nothing any strategy can use.
    pub fn unplayable(self, id: &str) -> Self {
        self.page(&detail_url(id), "<html><body><p>login required</p></body></html>")
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.script.failing.insert(url.to_string());
        self
    }

    /// Snapshotting this URL's document panics inside the renderer.
    pub fn panicking(mut self, url: &str) -> Self {
        self.script.panicking.insert(url.to_string());
        self
    }

    pub fn fail_launch(mut self) -> Self {
        self.script.fail_launch = true;
        self
    }

    /// `close` never resolves, like a browser stuck on shutdown.
    pub fn hang_close(mut self) -> Self {
        self.script.hang_close = true;
        self
    }

    /// `screenshot` never resolves.
    pub fn hang_screenshot(mut self) -> Self {
        self.script.hang_screenshot = true;
        self
    }

    pub fn navigation_delay(mut self, delay: Duration) -> Self {
        self.script.navigation_delay = delay;
        self
    }

    pub fn build(self) -> (Arc<ScriptedRenderer>, Arc<Script>) {
        let script = Arc::new(self.script);
        let renderer = Arc::new(ScriptedRenderer {
            script: Arc::clone(&script),
        });
        (renderer, script)
    }
}

pub struct ScriptedRenderer {
    script: Arc<Script>,
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn launch(&self, _profile: &DeviceProfile) -> Result<Box<dyn RenderContext>> {
        if self.script.fail_launch {
            return Err(anyhow!("chromium exited during startup"));
        }
        self.script.launches.fetch_add(1, Ordering::SeqCst);
        self.script.launch_times.lock().unwrap().push(Instant::now());
        let now_active = self.script.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.script.max_active.fetch_max(now_active, Ordering::SeqCst);

        Ok(Box::new(ScriptedContext {
            script: Arc::clone(&self.script),
            current: "about:blank".to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedContext {
    script: Arc<Script>,
    current: String,
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.script.navigations.lock().unwrap().push(url.to_string());
        if !self.script.navigation_delay.is_zero() {
            tokio::time::sleep(self.script.navigation_delay).await;
        }
        if self.script.failing.contains(url) {
            return Err(anyhow!("net::ERR_CONNECTION_RESET"));
        }
        self.current = url.to_string();
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn get_html(&self) -> Result<String> {
        if self.script.panicking.contains(&self.current) {
            panic!("renderer crashed on {}", self.current);
        }
        Ok(self
            .script
            .pages
            .get(&self.current)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        if self.script.hang_screenshot {
            std::future::pending::<()>().await;
        }
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        if self.script.hang_close {
            std::future::pending::<()>().await;
        }
        self.script.closes.fetch_add(1, Ordering::SeqCst);
        self.script.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Document helpers ──

pub fn detail_url(id: &str) -> String {
    format!("{DETAIL_BASE}{id}")
}

/// A listing page with one plain anchor per id.
pub fn listing(ids: &[&str]) -> String {
    let anchors: String = ids
        .iter()
        .map(|id| format!(r#"<div class="reel"><a href="/shorts/{id}?feature=feed">{id}</a></div>"#))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

/// A listing page whose tiles embed a playable `<video>` inside the anchor.
pub fn listing_with_media(ids: &[&str]) -> String {
    let tiles: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a href="/shorts/{id}"><video src="https://cdn.test/inline/{id}.mp4"></video></a>"#
            )
        })
        .collect();
    format!("<html><body>{tiles}</body></html>")
}

pub fn ids(items: &[reelfeed_runtime::model::Item]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

pub fn surfaces() -> (Surface, Surface) {
    (Surface::primary_feed(), Surface::trending())
}

// ── Wiring helpers ──

use reelfeed_runtime::acquisition::fallback::FallbackSynthesizer;
use reelfeed_runtime::acquisition::pipeline::{AcquisitionPipeline, PipelineConfig};
use reelfeed_runtime::acquisition::queue::{AcquisitionQueue, QueueConfig};
use reelfeed_runtime::service::{FeedService, ServiceConfig};
use reelfeed_runtime::session::BrowserSessionManager;

pub fn sessions(renderer: Arc<ScriptedRenderer>) -> BrowserSessionManager {
    BrowserSessionManager::new(renderer, DeviceProfile::mobile())
}

pub fn pipeline() -> AcquisitionPipeline {
    AcquisitionPipeline::new(PipelineConfig::without_delays())
}

/// A queue over the scripted renderer. Must be called inside a tokio runtime.
pub fn queue(renderer: Arc<ScriptedRenderer>, cooldown: Duration) -> AcquisitionQueue {
    AcquisitionQueue::spawn(pipeline(), sessions(renderer), QueueConfig { cooldown })
}

pub fn service(renderer: Arc<ScriptedRenderer>, config: ServiceConfig) -> FeedService {
    service_over(pipeline(), sessions(renderer), config)
}

/// A service over explicitly built stages, for tests that tune time bounds.
pub fn service_over(
    pipeline: AcquisitionPipeline,
    sessions: BrowserSessionManager,
    config: ServiceConfig,
) -> FeedService {
    FeedService::new(
        AcquisitionQueue::spawn(
            pipeline,
            sessions,
            QueueConfig {
                cooldown: Duration::from_millis(10),
            },
        ),
        FallbackSynthesizer::default(),
        config,
    )
}

/// Zero delays and a short navigation bound on both stages.
pub fn impatient_config(navigation_timeout: Duration) -> PipelineConfig {
    let mut config = PipelineConfig::without_delays();
    config.extractor.navigation_timeout = navigation_timeout;
    config.resolver.navigation_timeout = navigation_timeout;
    config
}

pub fn synthetic_config() -> ServiceConfig {
    ServiceConfig {
        use_synthetic_data: true,
        ..ServiceConfig::default()
    }
}
