// Copyright 2026 Reelfeed Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use reelfeed_runtime::cli;
use reelfeed_runtime::cli::serve::ServeArgs;

#[derive(Parser)]
#[command(
    name = "reelfeed",
    about = "Reelfeed: short-form video feed for small screens",
    version,
    after_help = "Run 'reelfeed <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default)
    Serve {
        /// Address to bind (overrides REELFEED_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides REELFEED_PORT / PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Serve synthetic items without launching a browser
        #[arg(long)]
        synthetic: bool,
    },
    /// Acquire one batch and print it
    Fetch {
        /// Maximum number of items
        #[arg(long)]
        limit: Option<usize>,
        /// Skip the browser and print synthetic items
        #[arg(long)]
        synthetic: bool,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("REELFEED_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("REELFEED_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("REELFEED_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("REELFEED_NO_COLOR", "1");
    }

    let result = match cli.command {
        None => cli::serve::run(ServeArgs::default()).await,
        Some(Commands::Serve {
            host,
            port,
            synthetic,
        }) => {
            cli::serve::run(ServeArgs {
                host,
                port,
                synthetic,
            })
            .await
        }
        Some(Commands::Fetch { limit, synthetic }) => cli::fetch::run(limit, synthetic).await,
        Some(Commands::Doctor) => cli::doctor::run().await,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "reelfeed", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
