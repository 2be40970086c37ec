// Intake - Classifies inputs and enforces size limits before jobs exist

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::adapters::toml_config::LimitsConfig;
use crate::domain::errors::DomainError;
use crate::domain::model::{Job, JobKind, MediaSource};
use crate::error::{UnmarkError, UnmarkResult};

/// Turns files and byte buffers into pending jobs
#[derive(Debug, Clone, Default)]
pub struct Intake {
    limits: LimitsConfig,
}

impl Intake {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Maximum accepted size for a kind, in bytes
    pub fn limit_for(&self, kind: JobKind) -> u64 {
        match kind {
            JobKind::Image => self.limits.max_image_bytes,
            JobKind::Video => self.limits.max_video_bytes,
        }
    }

    fn check(&self, file_name: &str, mime: Option<&str>, size: u64) -> UnmarkResult<JobKind> {
        let kind = JobKind::classify(file_name, mime).ok_or_else(|| {
            rejected(
                file_name,
                DomainError::Validation("unsupported file type".to_string()),
            )
        })?;

        let limit = self.limit_for(kind);
        if size > limit {
            return Err(rejected(
                file_name,
                DomainError::Validation(format!(
                    "{} of {} bytes exceeds the {} byte limit",
                    kind, size, limit
                )),
            ));
        }
        Ok(kind)
    }

    /// Admit an in-memory upload
    pub fn admit_bytes(
        &self,
        file_name: &str,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> UnmarkResult<Job> {
        let kind = self.check(file_name, mime, bytes.len() as u64)?;
        debug!("Admitted {} as {} ({} bytes)", file_name, kind, bytes.len());
        Ok(Job::new(kind, file_name, MediaSource::from_bytes(bytes)))
    }

    /// Admit a file on disk; the job reads it lazily
    pub async fn admit_path(&self, path: &Path) -> UnmarkResult<Job> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                rejected(
                    &path.display().to_string(),
                    DomainError::Validation("file name is not valid UTF-8".to_string()),
                )
            })?
            .to_string();

        let metadata = tokio::fs::metadata(path).await.map_err(|e| UnmarkError::Rejected {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(rejected(
                &path.display().to_string(),
                DomainError::Validation("not a regular file".to_string()),
            ));
        }

        let kind = self
            .check(&file_name, None, metadata.len())
            .map_err(|e| match e {
                UnmarkError::Rejected { message, .. } => UnmarkError::Rejected {
                    path: path.display().to_string(),
                    message,
                },
                other => other,
            })?;
        debug!("Admitted {} as {}", path.display(), kind);
        Ok(Job::new(kind, file_name, MediaSource::File(path.to_path_buf())))
    }

    /// Expand directories recursively into the supported files they contain.
    ///
    /// Plain file arguments pass through untouched so intake can reject them
    /// with a reason; directory entries of unknown type are skipped.
    pub fn expand(inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for input in inputs {
            if !input.is_dir() {
                files.push(input.clone());
                continue;
            }

            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping unreadable entry: {}", e);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| {
                    entry
                        .file_name()
                        .to_str()
                        .and_then(|name| JobKind::classify(name, None))
                        .is_some()
                })
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            debug!("Found {} media files under {}", found.len(), input.display());
            files.extend(found);
        }
        files
    }
}

fn rejected(name: &str, error: DomainError) -> UnmarkError {
    UnmarkError::Rejected {
        path: name.to_string(),
        message: error.to_string(),
    }
}
