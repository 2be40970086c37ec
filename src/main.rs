//! unmark CLI
//!
//! Removes watermarks from batches of images and videos.
//!
//! # Usage
//!
//! ```bash
//! unmark process photos/ clip.mp4 --output-dir cleaned/
//! unmark process a.png b.jpg --archive unmarked.zip --json
//! unmark inspect clip.mp4
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use unmark::adapters::init_logging;
use unmark::cli::{commands, Cli, Commands};

/// Main entry point for the unmark CLI application
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(&config.logging)?;

    info!("Starting unmark");

    let failures = match cli.command {
        Commands::Process(args) => commands::process(args, &config).await?.failures(),
        Commands::Inspect(args) => {
            commands::inspect(args, &config).await?;
            0
        }
    };

    if failures > 0 {
        info!("Finished with {} failures", failures);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
