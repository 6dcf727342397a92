//! Run the HTTP service in the foreground.

use crate::cli::output::{self, Styled};
use crate::config::AppConfig;
use crate::rest;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Command-line overrides for `reelfeed serve`.
#[derive(Debug, Default)]
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub synthetic: bool,
}

impl ServeArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.synthetic {
            config.service.use_synthetic_data = true;
        }
    }
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let s = Styled::new();
    super::init_tracing(output::is_verbose(), output::is_json());

    let mut config = AppConfig::from_env();
    args.apply(&mut config);
    info!(
        synthetic = config.service.use_synthetic_data,
        source = %config.service.source_tag,
        "starting Reelfeed v{}",
        env!("CARGO_PKG_VERSION")
    );

    let renderer = super::select_renderer(&config);
    let service = Arc::new(super::build_service(&config, renderer));

    let addr = config.bind_addr();
    if !output::is_quiet() {
        eprintln!("  {} Reelfeed v{} on http://{addr}", s.ok_sym(), env!("CARGO_PKG_VERSION"));
        if config.service.use_synthetic_data {
            eprintln!("  {} serving synthetic items only", s.warn_sym());
        }
    }

    rest::serve(&addr, service).await?;

    if !output::is_quiet() {
        eprintln!("  {} Reelfeed stopped.", s.ok_sym());
    }
    Ok(())
}
