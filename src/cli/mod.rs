//! CLI module for unmark
//!
//! This module handles command-line argument parsing, configuration layering
//! and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::toml_config::AppConfig;
use crate::error::UnmarkResult;

pub mod args;
pub mod commands;
pub mod progress;

/// unmark - Watermark removal for images and videos
///
/// Cleans batches of images and videos, writing the results individually or
/// bundled into a single zip archive.
#[derive(Parser)]
#[command(name = "unmark")]
#[command(about = "Remove watermarks from images and videos in batches")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./unmark.toml when present)
    #[arg(long, global = true, env = "UNMARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Maximum number of jobs processed at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Remove watermarks from a batch of files
    Process(args::ProcessArgs),
    /// Show kind, dimensions and watermark geometry of a file
    Inspect(args::InspectArgs),
}

impl Cli {
    /// Layer flags over environment over config file over defaults
    pub fn resolve_config(&self) -> UnmarkResult<AppConfig> {
        let mut config = AppConfig::discover(self.config.as_deref())?;
        config.apply_env()?;

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.scheduler.concurrency = concurrency;
        }

        config.validate()?;
        Ok(config)
    }
}
