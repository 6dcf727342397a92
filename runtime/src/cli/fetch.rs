//! One-shot acquisition from the command line.

use crate::cli::output::{self, Styled};
use crate::config::AppConfig;
use anyhow::Result;

/// Acquire one batch without starting the HTTP server and print it.
pub async fn run(limit: Option<usize>, synthetic: bool) -> Result<()> {
    super::init_tracing(output::is_verbose(), false);

    let mut config = AppConfig::from_env();
    if synthetic {
        config.service.use_synthetic_data = true;
    }

    let renderer = super::select_renderer(&config);
    let service = super::build_service(&config, renderer);
    let batch = service.request_items(limit).await;

    if output::is_json() {
        output::print_json(&batch);
        return Ok(());
    }

    let s = Styled::new();
    let sym = if batch.is_synthetic() { s.warn_sym() } else { s.ok_sym() };
    println!("  {sym} {} item(s) from {}", batch.count, batch.source_tag);
    for item in &batch.items {
        println!(
            "    {:<16} {}",
            item.id,
            item.media_url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
