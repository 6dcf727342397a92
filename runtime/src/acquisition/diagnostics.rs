//! Per-run debug artifacts: a viewport screenshot and the raw document.
//!
//! Written once per pipeline run for offline inspection and never read back.
//! Failures here are logged and otherwise ignored.

use super::bounded;
use crate::renderer::RenderContext;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const SCREENSHOT_FILE: &str = "debug_feed.png";
const DOCUMENT_FILE: &str = "debug_feed.html";

/// Bound on each capture step.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(20);

/// Paths written by one capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub screenshot: Option<PathBuf>,
    pub document: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
    step_timeout: Duration,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Diagnostics {
    /// Capture nothing.
    pub fn disabled() -> Self {
        Self {
            dir: None,
            step_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    /// Write artifacts into `dir`, creating it on first use.
    pub fn into_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            step_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, limit: Duration) -> Self {
        self.step_timeout = limit;
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Capture the current page. Best effort.
    pub async fn capture(&self, ctx: &dyn RenderContext) -> Artifacts {
        let Some(dir) = &self.dir else {
            return Artifacts::default();
        };

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), "cannot create diagnostics dir: {e}");
            return Artifacts::default();
        }

        let mut artifacts = Artifacts::default();

        match bounded(self.step_timeout, "screenshot", ctx.screenshot()).await {
            Ok(png) => artifacts.screenshot = write(dir.join(SCREENSHOT_FILE), &png).await,
            Err(e) => warn!("screenshot capture failed: {e:#}"),
        }

        match bounded(self.step_timeout, "document capture", ctx.get_html()).await {
            Ok(html) => artifacts.document = write(dir.join(DOCUMENT_FILE), html.as_bytes()).await,
            Err(e) => warn!("document capture failed: {e:#}"),
        }

        debug!(?artifacts, "diagnostics saved");
        artifacts
    }
}

async fn write(path: PathBuf, bytes: &[u8]) -> Option<PathBuf> {
    match tokio::fs::write(&path, bytes).await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), "failed to write diagnostics artifact: {e}");
            None
        }
    }
}
