//! Archive packaging of completed job outputs

use async_zip::base::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use futures_lite::io::Cursor;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::model::{Job, JobId, JobOutput, JobStatus};
use crate::domain::rules::output_entry_name;
use crate::error::{UnmarkError, UnmarkResult};

/// One file inside a produced archive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub job: JobId,
    pub bytes: usize,
}

/// Zip archive held in memory
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Vec<u8>,
    pub entries: Vec<ArchiveEntry>,
}

/// Bundles every Completed job's output into a single zip
#[derive(Debug, Clone)]
pub struct PackagingService {
    prefix: String,
}

impl PackagingService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Entry name and output for each Completed job, in job order
    pub fn entries<'a>(&self, jobs: &'a [Job]) -> Vec<(String, &'a Job, &'a JobOutput)> {
        jobs.iter()
            .filter(|job| job.status() == JobStatus::Completed)
            .filter_map(|job| {
                let output = job.output()?;
                let name = output_entry_name(&self.prefix, job.base_name(), job.kind);
                Some((name, job, output))
            })
            .collect()
    }

    /// Build the archive; jobs that are not Completed are left out
    pub async fn package(&self, jobs: &[Job]) -> UnmarkResult<Archive> {
        let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
        let mut entries: Vec<ArchiveEntry> = Vec::new();

        for (name, job, output) in self.entries(jobs) {
            if entries.iter().any(|entry| entry.name == name) {
                warn!(
                    "Archive already has an entry named {} ({} shares its base name)",
                    name, job.file_name
                );
            }
            let builder = ZipEntryBuilder::new(name.clone().into(), Compression::Stored);
            writer
                .write_entry_whole(builder, output.data.as_slice())
                .await
                .map_err(|e| UnmarkError::Archive {
                    message: format!("Failed to add {}: {}", name, e),
                })?;
            debug!("Packed {} ({} bytes)", name, output.len());
            entries.push(ArchiveEntry {
                name,
                job: job.id,
                bytes: output.len(),
            });
        }

        let bytes = writer
            .close()
            .await
            .map_err(|e| UnmarkError::Archive {
                message: format!("Failed to finalize archive: {}", e),
            })?
            .into_inner();

        info!(
            "Packaged {} of {} jobs into archive ({} bytes)",
            entries.len(),
            jobs.len(),
            bytes.len()
        );
        Ok(Archive { bytes, entries })
    }
}
