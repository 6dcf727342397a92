//! CLI subcommand implementations for the Reelfeed binary.

pub mod doctor;
pub mod fetch;
pub mod output;
pub mod serve;

use crate::acquisition::fallback::FallbackSynthesizer;
use crate::acquisition::pipeline::AcquisitionPipeline;
use crate::acquisition::queue::AcquisitionQueue;
use crate::config::AppConfig;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, Renderer};
use crate::service::FeedService;
use crate::session::BrowserSessionManager;
use std::sync::Arc;
use tracing::{info, warn};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `reelfeed=info`, or `reelfeed=debug`
/// with `--verbose`. Logs go to stderr so `--json` output stays clean.
pub fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "reelfeed=debug" } else { "reelfeed=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Pick the renderer: Chromium when it can be located, the no-op renderer otherwise.
pub fn select_renderer(config: &AppConfig) -> Arc<dyn Renderer> {
    if config.service.use_synthetic_data {
        info!("synthetic mode; browser will not be launched");
        return Arc::new(NoopRenderer);
    }
    match ChromiumRenderer::new(config.chromium_path.as_ref()) {
        Ok(renderer) => {
            info!("Chromium renderer initialized");
            Arc::new(renderer)
        }
        Err(e) => {
            warn!("Failed to initialize Chromium: {e:#}");
            warn!("every acquisition will fall back to synthetic items");
            Arc::new(NoopRenderer)
        }
    }
}

/// Wire renderer, session manager, pipeline, queue and service together.
/// Must be called inside a tokio runtime.
pub fn build_service(config: &AppConfig, renderer: Arc<dyn Renderer>) -> FeedService {
    let sessions = BrowserSessionManager::new(renderer, config.profile.clone())
        .with_launch_attempts(config.launch_attempts);
    let pipeline =
        AcquisitionPipeline::new(config.pipeline.clone()).with_diagnostics(config.diagnostics());
    let queue = AcquisitionQueue::spawn(pipeline, sessions, config.queue.clone());

    FeedService::new(
        queue,
        FallbackSynthesizer::new(config.fallback_link_base.clone()),
        config.service.clone(),
    )
}
