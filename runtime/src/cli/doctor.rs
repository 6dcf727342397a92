//! Environment readiness check.

use crate::cli::output::{self, Styled};
use crate::config::AppConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability and report the effective configuration.
pub async fn run() -> Result<()> {
    let config = AppConfig::from_env();
    let chromium = find_chromium(config.chromium_path.as_ref());

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "synthetic": config.service.use_synthetic_data,
            "bind": config.bind_addr(),
            "debugDir": config.debug_dir.as_ref().map(|p| p.display().to_string()),
            "ready": chromium.is_some() || config.service.use_synthetic_data,
        }));
        return Ok(());
    }

    let s = Styled::new();
    println!("Reelfeed Doctor");
    println!("===============");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium {
        Some(path) => println!("{} Chromium found: {}", s.ok_sym(), path.display()),
        None => println!(
            "{} Chromium NOT found. Set REELFEED_CHROMIUM_PATH or install Chrome.",
            s.warn_sym()
        ),
    }
    if config.service.use_synthetic_data {
        println!("{} Synthetic mode is on; the browser will not be used", s.warn_sym());
    }
    if let Some(dir) = &config.debug_dir {
        println!("{} Debug artifacts go to {}", s.ok_sym(), dir.display());
    }
    println!("{} Will listen on {}", s.ok_sym(), config.bind_addr());

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: DEGRADED (every request is served synthetic items)");
    }
    Ok(())
}
