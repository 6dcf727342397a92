//! Chromium-based renderer using chromiumoxide.

use super::{DeviceProfile, NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long a polite shutdown may take before the process is killed.
const GRACEFUL_CLOSE: Duration = Duration::from_secs(10);

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. Explicit path from config
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // 2. REELFEED_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("REELFEED_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. ~/.reelfeed/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".reelfeed/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".reelfeed/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".reelfeed/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".reelfeed/chromium/chrome-linux64/chrome"),
                home.join(".reelfeed/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 4. System PATH
    for bin in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(bin) {
            return Some(path);
        }
    }

    // 5. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer. Each `launch` starts a separate headless process.
pub struct ChromiumRenderer {
    chrome_path: PathBuf,
}

impl ChromiumRenderer {
    /// Locate Chromium and build a renderer; fails when no binary is found.
    pub fn new(explicit: Option<&PathBuf>) -> Result<Self> {
        let chrome_path =
            find_chromium(explicit).context("Chromium not found. Set REELFEED_CHROMIUM_PATH.")?;
        Ok(Self { chrome_path })
    }

    fn browser_config(&self, profile: &DeviceProfile) -> Result<BrowserConfig> {
        BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .new_headless_mode()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-accelerated-2d-canvas")
            .arg("--no-first-run")
            .arg("--no-zygote")
            .arg("--disable-gpu")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", profile.user_agent))
            .window_size(profile.width, profile.height)
            .viewport(Viewport {
                width: profile.width,
                height: profile.height,
                device_scale_factor: Some(profile.device_scale_factor),
                emulating_mobile: profile.is_mobile,
                is_landscape: false,
                has_touch: profile.has_touch,
            })
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self, profile: &DeviceProfile) -> Result<Box<dyn RenderContext>> {
        let config = self.browser_config(profile)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // The handler must be polled for the browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e).context("failed to create new page");
            }
        };

        Ok(Box::new(ChromiumContext {
            browser,
            page,
            handler_task,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// A Chromium page plus the browser process that owns it.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();
        let page = &self.page;

        let result = tokio::time::timeout(Duration::from_millis(timeout_ms), async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .unwrap_or_default();
        Ok(url)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(ScreenshotParams::builder().build())
            .await
            .context("failed to capture screenshot")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            mut browser,
            page,
            handler_task,
        } = *self;

        let graceful = tokio::time::timeout(GRACEFUL_CLOSE, async {
            let _ = page.close().await;
            browser.close().await?;
            browser.wait().await?;
            Ok::<_, anyhow::Error>(())
        })
        .await;

        let outcome = match graceful {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.context("failed to close Chromium")),
            Err(_) => Err(anyhow::anyhow!(
                "Chromium did not exit within {}ms",
                GRACEFUL_CLOSE.as_millis()
            )),
        };
        if outcome.is_err() {
            warn!("killing Chromium after failed close");
            if let Some(Err(e)) = browser.kill().await {
                debug!("kill failed: {e}");
            }
        }
        handler_task.abort();
        outcome
    }
}
