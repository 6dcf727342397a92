//! Configuration loading and resolution.
//!
//! Defaults first, then environment variables, then CLI flags (applied by the
//! binary). Both the `REELFEED_*` names and the legacy `PORT` /
//! `USE_MOCK_DATA` names are honoured.

use crate::acquisition::diagnostics::Diagnostics;
use crate::acquisition::fallback::DEFAULT_FALLBACK_LINK_BASE;
use crate::acquisition::pipeline::PipelineConfig;
use crate::acquisition::queue::QueueConfig;
use crate::renderer::DeviceProfile;
use crate::service::ServiceConfig;
use crate::session::DEFAULT_LAUNCH_ATTEMPTS;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub service: ServiceConfig,
    pub pipeline: PipelineConfig,
    pub queue: QueueConfig,
    pub profile: DeviceProfile,
    pub chromium_path: Option<PathBuf>,
    pub launch_attempts: u32,
    /// Where per-run debug artifacts go; `None` disables them.
    pub debug_dir: Option<PathBuf>,
    pub fallback_link_base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            service: ServiceConfig::default(),
            pipeline: PipelineConfig::default(),
            queue: QueueConfig::default(),
            profile: DeviceProfile::mobile(),
            chromium_path: None,
            launch_attempts: DEFAULT_LAUNCH_ATTEMPTS,
            debug_dir: None,
            fallback_link_base: DEFAULT_FALLBACK_LINK_BASE.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|&k| lookup(k))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = get(&["REELFEED_HOST"]) {
            config.host = host;
        }
        if let Some(port) = get(&["REELFEED_PORT", "PORT"]) {
            match port.parse() {
                Ok(p) => config.port = p,
                Err(_) => warn!("ignoring invalid port {port:?}"),
            }
        }
        if let Some(flag) = get(&["REELFEED_USE_SYNTHETIC", "USE_MOCK_DATA"]) {
            config.service.use_synthetic_data = parse_flag(&flag);
        }
        if let Some(tag) = get(&["REELFEED_SOURCE_TAG"]) {
            config.service.source_tag = tag;
        }
        if let Some(path) = get(&["REELFEED_CHROMIUM_PATH"]) {
            config.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = get(&["REELFEED_DEBUG_DIR"]) {
            config.debug_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = get(&["REELFEED_COOLDOWN_MS"]) {
            match ms.parse::<u64>() {
                Ok(ms) => config.queue.cooldown = Duration::from_millis(ms),
                Err(_) => warn!("ignoring invalid cool-down {ms:?}"),
            }
        }
        if let Some(n) = get(&["REELFEED_SCROLLS"]) {
            match n.parse() {
                Ok(n) => config.pipeline.extractor.scroll_iterations = n,
                Err(_) => warn!("ignoring invalid scroll count {n:?}"),
            }
        }

        config
    }

    pub fn diagnostics(&self) -> Diagnostics {
        match &self.debug_dir {
            Some(dir) => Diagnostics::into_dir(dir),
            None => Diagnostics::disabled(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
