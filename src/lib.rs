//! unmark watermark removal library
//!
//! Batch removal of a fixed-geometry watermark from images and videos. Images
//! are transformed once; videos are sampled on a fixed timestamp grid,
//! transformed frame by frame and re-encoded with their audio track. Completed
//! outputs can be bundled into a single zip archive.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod ports;

// Re-export commonly used types
pub use app::{BatchScheduler, BatchSnapshot, JobProcessor};
pub use domain::errors::DomainError;
pub use domain::model::{Job, JobId, JobKind, JobOutput, JobStatus, MediaSource};
pub use engine::VideoPipeline;
pub use error::{UnmarkError, UnmarkResult};
pub use output::PackagingService;
