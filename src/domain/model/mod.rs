// Domain models - Jobs, sources, outputs and frame metadata

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::{DomainError, JobError};

/// Decoded RGBA frame or still image
pub type Frame = image::RgbaImage;

/// Mime tag of every image job output
pub const IMAGE_OUTPUT_MIME: &str = "image/png";

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Job identifier - creation time plus a process-wide sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId {
    seq: u64,
    created_ms: i64,
}

impl JobId {
    /// Allocate the next identifier
    pub fn next() -> Self {
        Self {
            seq: JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            created_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}-{}", self.created_ms, self.seq)
    }
}

/// Kind of media a job processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Image,
    Video,
}

impl JobKind {
    const IMAGE_MIMES: [&'static str; 3] = ["image/jpeg", "image/png", "image/webp"];
    const VIDEO_MIMES: [&'static str; 3] = ["video/mp4", "video/webm", "video/quicktime"];
    const IMAGE_EXTENSIONS: [&'static str; 4] = ["jpg", "jpeg", "png", "webp"];
    const VIDEO_EXTENSIONS: [&'static str; 4] = ["mp4", "webm", "mov", "qt"];

    /// Classify by mime type first, then by file extension
    pub fn classify(file_name: &str, mime: Option<&str>) -> Option<Self> {
        if let Some(mime) = mime {
            let essence = mime.split(';').next().unwrap_or_default().trim().to_lowercase();
            if Self::IMAGE_MIMES.contains(&essence.as_str()) {
                return Some(JobKind::Image);
            }
            if Self::VIDEO_MIMES.contains(&essence.as_str()) {
                return Some(JobKind::Video);
            }
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)?;
        if Self::IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(JobKind::Image)
        } else if Self::VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(JobKind::Video)
        } else {
            None
        }
    }

    /// Extension used when naming this kind's output
    pub fn output_extension(&self) -> &'static str {
        match self {
            JobKind::Image => "png",
            JobKind::Video => "webm",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Image => write!(f, "image"),
            JobKind::Video => write!(f, "video"),
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Pending -> Processing -> {Completed | Failed}, nothing else
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Handle to a job's original content
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// File on disk
    File(PathBuf),
    /// Bytes already held in memory
    Memory(Arc<Vec<u8>>),
}

impl MediaSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        MediaSource::Memory(Arc::new(bytes))
    }

    /// Load the full content
    pub async fn read_all(&self) -> Result<Arc<Vec<u8>>, DomainError> {
        match self {
            MediaSource::File(path) => tokio::fs::read(path)
                .await
                .map(Arc::new)
                .map_err(|e| DomainError::Decode(format!("Cannot read {}: {}", path.display(), e))),
            MediaSource::Memory(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}

/// Encoded output blob with its mime tag
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    pub mime: String,
    pub data: Arc<Vec<u8>>,
}

impl JobOutput {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data: Arc::new(data),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One unit of work tracked through its status lifecycle
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub file_name: String,
    pub source: MediaSource,
    pub created_at: DateTime<Utc>,
    status: JobStatus,
    output: Option<JobOutput>,
    error: Option<JobError>,
    progress_percent: u8,
}

impl Job {
    /// Create a pending job
    pub fn new(kind: JobKind, file_name: impl Into<String>, source: MediaSource) -> Self {
        Self {
            id: JobId::next(),
            kind,
            file_name: file_name.into(),
            source,
            created_at: Utc::now(),
            status: JobStatus::Pending,
            output: None,
            error: None,
            progress_percent: 0,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn output(&self) -> Option<&JobOutput> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// File name without its extension
    pub fn base_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.file_name)
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Claim a pending job for processing
    pub fn begin(&mut self) -> Result<(), DomainError> {
        self.transition(JobStatus::Processing)?;
        self.progress_percent = 0;
        Ok(())
    }

    /// Attach output and mark completed
    pub fn complete(&mut self, output: JobOutput) -> Result<(), DomainError> {
        self.transition(JobStatus::Completed)?;
        self.output = Some(output);
        self.progress_percent = 100;
        Ok(())
    }

    /// Attach error and mark failed
    pub fn fail(&mut self, error: &DomainError) -> Result<(), DomainError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(JobError::from(error));
        Ok(())
    }

    /// Record progress while processing; values never go backwards
    pub fn set_progress(&mut self, percent: u8) {
        if self.status == JobStatus::Processing {
            self.progress_percent = self.progress_percent.max(percent.min(100));
        }
    }

    /// Drop derived handles held by this job
    pub fn release(&mut self) {
        self.output = None;
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.to_string(),
            file_name: self.file_name.clone(),
            kind: self.kind,
            status: self.status,
            progress_percent: self.progress_percent,
            output_mime: self.output.as_ref().map(|o| o.mime.clone()),
            output_bytes: self.output.as_ref().map(JobOutput::len),
            error: self.error.clone(),
        }
    }
}

/// Serialisable view of a job
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub file_name: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress_percent: u8,
    pub output_mime: Option<String>,
    pub output_bytes: Option<usize>,
    pub error: Option<JobError>,
}

/// Aggregate batch counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total).min(100) as u8
    }

    pub fn is_finished(&self) -> bool {
        self.processed >= self.total
    }
}

/// Top-left corner of the watermark box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

/// Watermark geometry for given frame dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WatermarkInfo {
    pub size: u32,
    pub position: Position,
}

/// Properties of an opened video source
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Frame rate declared by the container, if any
    pub declared_frame_rate: Option<f64>,
}

impl VideoMetadata {
    pub fn new(duration: f64, width: u32, height: u32) -> Result<Self, DomainError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::Decode(format!("Invalid duration: {}", duration)));
        }
        if width == 0 || height == 0 {
            return Err(DomainError::Decode("Video dimensions cannot be zero".to_string()));
        }
        Ok(Self {
            duration,
            width,
            height,
            declared_frame_rate: None,
        })
    }

    pub fn with_declared_frame_rate(mut self, fps: f64) -> Self {
        self.declared_frame_rate = Some(fps).filter(|fps| fps.is_finite() && *fps > 0.0);
        self
    }
}

/// Audio track exposed by a source, attached to the output once
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub stream_index: usize,
    pub codec: Option<String>,
    /// Container the track is read from
    pub origin: Option<PathBuf>,
}

/// One sampled frame within a pipeline iteration
#[derive(Debug, Clone)]
pub struct FrameSample {
    pub index: usize,
    pub timestamp: f64,
    pub frame: Frame,
}

#[cfg(test)]
mod tests;
