//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::toml_config::AppConfig;
use crate::app::{AppContainer, BatchSnapshot, DefaultAppContainer, Intake, MediaBackend};
use crate::cli::args::{InspectArgs, ProcessArgs};
use crate::cli::progress::ProgressBarObserver;
use crate::domain::model::{JobKind, JobStatus, MediaSource, WatermarkInfo};
use crate::engine::image::decode_image;
use crate::output::{ArchiveEntry, OutputWriter};

/// Input refused before a job was created
#[derive(Debug, Serialize)]
pub struct RejectedInput {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub entries: Vec<ArchiveEntry>,
}

/// Everything the process command did
#[derive(Debug, Serialize)]
pub struct ProcessReport {
    pub batch: BatchSnapshot,
    pub rejected: Vec<RejectedInput>,
    pub outputs: Vec<PathBuf>,
    pub archive: Option<ArchiveReport>,
}

impl ProcessReport {
    /// Failed jobs plus rejected inputs
    pub fn failures(&self) -> usize {
        self.batch.count(JobStatus::Failed) + self.rejected.len()
    }
}

/// Execute the process command
pub async fn process(args: ProcessArgs, config: &AppConfig) -> Result<ProcessReport> {
    let files = Intake::expand(&args.inputs);
    if files.is_empty() {
        anyhow::bail!("No input files found");
    }
    info!("Processing {} inputs", files.len());

    let observer = Arc::new(if args.json {
        ProgressBarObserver::hidden()
    } else {
        ProgressBarObserver::new()
    });
    let container = DefaultAppContainer::new(config, observer.clone());
    let intake = container.intake();
    let scheduler = container.scheduler();

    let mut jobs = Vec::new();
    let mut rejected = Vec::new();
    for path in files {
        match intake.admit_path(&path).await {
            Ok(job) => jobs.push(job),
            Err(e) => {
                warn!("{}", e);
                rejected.push(RejectedInput {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    scheduler.enqueue(jobs);
    scheduler.run().await;
    observer.finish();

    let jobs = scheduler.jobs();
    let writer = OutputWriter::new().with_overwrite(args.overwrite);
    let packaging = container.packaging();

    // Individual files go to the working directory unless told otherwise
    let output_dir = match (&args.output_dir, &args.archive) {
        (Some(dir), _) => Some(dir.clone()),
        (None, Some(_)) => None,
        (None, None) => Some(PathBuf::from(".")),
    };
    let outputs = match &output_dir {
        Some(dir) => writer
            .write_outputs(dir, &jobs, &packaging)
            .await
            .context("Failed to write outputs")?,
        None => Vec::new(),
    };

    let archive = match &args.archive {
        Some(path) => {
            let archive = packaging
                .package(&jobs)
                .await
                .context("Failed to package outputs")?;
            writer
                .write_archive(path, &archive)
                .await
                .context("Failed to write archive")?;
            Some(ArchiveReport {
                path: path.clone(),
                entries: archive.entries,
            })
        }
        None => None,
    };

    let report = ProcessReport {
        batch: scheduler.snapshot(),
        rejected,
        outputs,
        archive,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_process_report(&report);
    }
    Ok(report)
}

fn print_process_report(report: &ProcessReport) {
    for job in &report.batch.jobs {
        match &job.error {
            Some(error) => println!("  FAILED     {}  {}", job.file_name, error.message),
            None => println!("  {:<10} {}", job.status.to_string().to_uppercase(), job.file_name),
        }
    }
    for input in &report.rejected {
        println!("  REJECTED   {}  {}", input.path.display(), input.reason);
    }
    for path in &report.outputs {
        println!("  wrote {}", path.display());
    }
    if let Some(archive) = &report.archive {
        println!(
            "  archive {} ({} entries)",
            archive.path.display(),
            archive.entries.len()
        );
    }
    println!(
        "{} completed, {} failed, {} rejected",
        report.batch.count(JobStatus::Completed),
        report.batch.count(JobStatus::Failed),
        report.rejected.len()
    );
}

/// Facts about a single input file
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub kind: JobKind,
    pub size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
    pub declared_frame_rate: Option<f64>,
    pub has_audio: Option<bool>,
    pub watermark: Option<WatermarkInfo>,
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, config: &AppConfig) -> Result<InspectReport> {
    let report = inspect_file(&args.input, config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File:       {}", report.path.display());
        println!("Kind:       {}", report.kind);
        println!("Size:       {} bytes", report.size_bytes);
        if let (Some(width), Some(height)) = (report.width, report.height) {
            println!("Dimensions: {}x{}", width, height);
        }
        if let Some(duration) = report.duration {
            println!("Duration:   {:.3}s", duration);
        }
        if let Some(fps) = report.declared_frame_rate {
            println!("Frame rate: {:.3} fps", fps);
        }
        if let Some(audio) = report.has_audio {
            println!("Audio:      {}", if audio { "yes" } else { "no" });
        }
        if let Some(watermark) = &report.watermark {
            println!(
                "Watermark:  {}px at ({}, {})",
                watermark.size, watermark.position.x, watermark.position.y
            );
        }
    }
    Ok(report)
}

async fn inspect_file(path: &Path, config: &AppConfig) -> Result<InspectReport> {
    let container = DefaultAppContainer::new(config, Arc::new(ProgressBarObserver::hidden()));
    let job = container.intake().admit_path(path).await?;
    let transform = container.transform();
    let size_bytes = tokio::fs::metadata(path).await?.len();

    let mut report = InspectReport {
        path: path.to_path_buf(),
        kind: job.kind,
        size_bytes,
        width: None,
        height: None,
        duration: None,
        declared_frame_rate: None,
        has_audio: None,
        watermark: None,
    };

    match job.kind {
        JobKind::Image => {
            let bytes = job.source.read_all().await?;
            let image = tokio::task::spawn_blocking(move || decode_image(&bytes)).await??;
            let (width, height) = image.dimensions();
            report.width = Some(width);
            report.height = Some(height);
            report.watermark = Some(transform.watermark_info(width, height));
        }
        JobKind::Video => {
            let opener = MediaBackend::detect().opener;
            let source = MediaSource::File(path.to_path_buf());
            match opener.open(&source, &job.file_name).await {
                Ok(mut frames) => {
                    let metadata = frames.metadata().clone();
                    report.width = Some(metadata.width);
                    report.height = Some(metadata.height);
                    report.duration = Some(metadata.duration);
                    report.declared_frame_rate = metadata.declared_frame_rate;
                    report.has_audio = Some(frames.audio_track().is_some());
                    report.watermark =
                        Some(transform.watermark_info(metadata.width, metadata.height));
                    frames.close().await;
                }
                Err(e) => warn!("Cannot read video details: {}", e),
            }
        }
    }

    Ok(report)
}
