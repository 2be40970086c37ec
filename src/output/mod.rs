//! Output packaging and file writing module

use serde::{Deserialize, Serialize};

pub mod archive;
pub mod writer;

pub use archive::{Archive, ArchiveEntry, PackagingService};
pub use writer::OutputWriter;

/// Overwrite policy for files that already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Replace existing files
    Always,
    /// Fail instead of replacing
    Never,
}
