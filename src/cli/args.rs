//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::output::OverwritePolicy;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image or video files; directories are searched recursively
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving one cleaned file per completed job
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Zip archive bundling every completed job
    #[arg(short, long)]
    pub archive: Option<PathBuf>,

    /// Behaviour when an output file already exists
    #[arg(long, value_enum, default_value = "always")]
    pub overwrite: OverwritePolicy,

    /// Print the batch summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image or video file
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
