//! Output file writer implementation

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::model::Job;
use crate::error::{UnmarkError, UnmarkResult};
use crate::output::archive::{Archive, PackagingService};
use crate::output::OverwritePolicy;

/// Writes outputs to disk through a temp file and rename
#[derive(Debug, Clone)]
pub struct OutputWriter {
    overwrite: OverwritePolicy,
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputWriter {
    pub fn new() -> Self {
        Self {
            overwrite: OverwritePolicy::Always,
        }
    }

    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Write each Completed job's output into `dir` using archive entry names.
    ///
    /// When two jobs map to the same name only the first is written.
    pub async fn write_outputs(
        &self,
        dir: &Path,
        jobs: &[Job],
        naming: &PackagingService,
    ) -> UnmarkResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        let mut names = HashSet::new();
        for (name, job, output) in naming.entries(jobs) {
            if !names.insert(name.clone()) {
                warn!(
                    "Skipping output of {}: {} was already written by an earlier job",
                    job.file_name, name
                );
                continue;
            }
            let path = dir.join(&name);
            self.write_file(&path, output.data.as_slice().to_vec()).await?;
            written.push(path);
        }
        info!("Wrote {} outputs to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Write an archive produced by the packaging service
    pub async fn write_archive(&self, path: &Path, archive: &Archive) -> UnmarkResult<()> {
        self.write_file(path, archive.bytes.clone()).await?;
        info!(
            "Wrote archive {} with {} entries",
            path.display(),
            archive.entries.len()
        );
        Ok(())
    }

    /// Atomically replace `path` with `data`
    pub async fn write_file(&self, path: &Path, data: Vec<u8>) -> UnmarkResult<()> {
        let path = path.to_path_buf();
        let overwrite = self.overwrite;
        let display = path.display().to_string();

        tokio::task::spawn_blocking(move || write_atomic(&path, &data, overwrite))
            .await
            .map_err(|e| UnmarkError::Output {
                path: display,
                message: format!("Writer task failed: {}", e),
            })?
    }
}

fn write_atomic(path: &Path, data: &[u8], overwrite: OverwritePolicy) -> UnmarkResult<()> {
    let output_error = |message: String| UnmarkError::Output {
        path: path.display().to_string(),
        message,
    };

    if overwrite == OverwritePolicy::Never && path.exists() {
        return Err(output_error("File already exists".to_string()));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| output_error(format!("Failed to create directory: {}", e)))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| output_error(format!("Failed to create temporary file: {}", e)))?;
    debug!("Writing to temporary file: {}", temp.path().display());

    temp.write_all(data)
        .map_err(|e| output_error(format!("Failed to write data: {}", e)))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| output_error(format!("Failed to sync file to disk: {}", e)))?;

    let persisted = match overwrite {
        OverwritePolicy::Always => temp.persist(path).map(|_| ()),
        OverwritePolicy::Never => temp.persist_noclobber(path).map(|_| ()),
    };
    persisted.map_err(|e| output_error(format!("Failed to rename temporary file: {}", e.error)))
}
