// Ports - Interface definitions (contracts)

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Watermark removal capability, shared by concurrently running jobs
#[async_trait]
pub trait Transform: Send + Sync {
    /// Map one frame or still image to its watermark-free counterpart
    async fn transform(&self, frame: Frame) -> Result<Frame, DomainError>;

    /// Watermark geometry for the given dimensions
    fn watermark_info(&self, width: u32, height: u32) -> WatermarkInfo;
}

/// Seekable decoded video
#[async_trait]
pub trait FrameSource: Send {
    /// Duration, dimensions and declared rate
    fn metadata(&self) -> &VideoMetadata;

    /// Audio track to carry into the output, if the source has one
    fn audio_track(&self) -> Option<AudioTrack>;

    /// Seek to `timestamp` seconds; resolves once the seek has settled
    async fn seek(&mut self, timestamp: f64) -> Result<(), DomainError>;

    /// Decode the frame at the current position
    async fn read_frame(&mut self) -> Result<Frame, DomainError>;

    /// Begin transient playback for frame-rate sampling
    async fn start_playback(&mut self) -> Result<(), DomainError> {
        Err(DomainError::UnsupportedCapability(
            "Frame presentation events are not available".to_string(),
        ))
    }

    /// Wait for the next presented frame during playback
    async fn next_presented_frame(&mut self) -> Result<(), DomainError> {
        Err(DomainError::UnsupportedCapability(
            "Frame presentation events are not available".to_string(),
        ))
    }

    /// Stop transient playback
    async fn stop_playback(&mut self) {}

    /// Release decoder state and temporary handles
    async fn close(&mut self) {}
}

/// Parameters for opening an encoder session
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// Live encoder session consuming frames in timestamp order
#[async_trait]
pub trait FrameSink: Send {
    /// Negotiated mime tag of the produced blob
    fn mime(&self) -> &str;

    /// Attach the audio track; only valid before the first frame
    async fn attach_audio(&mut self, track: AudioTrack) -> Result<(), DomainError>;

    /// Submit the next frame; timestamps must strictly increase
    async fn push_frame(&mut self, frame: Frame, timestamp: f64) -> Result<(), DomainError>;

    /// Flush buffered data and return the encoded blob
    async fn finish(&mut self) -> Result<JobOutput, DomainError>;

    /// Discard the session and any partial bytes
    async fn abort(&mut self);
}

/// Opens encoder sessions for negotiated codecs
#[async_trait]
pub trait EncoderFactory: Send + Sync {
    /// Whether this runtime can encode `mime`
    fn supports(&self, mime: &str) -> bool;

    async fn open(&self, settings: EncoderSettings) -> Result<Box<dyn FrameSink>, DomainError>;
}

/// Frame-rate estimation for a source with unknown native rate
#[async_trait]
pub trait FrameRateProbe: Send + Sync {
    /// Estimated frames per second; never fails, falls back to a default
    async fn estimate(&self, source: &mut dyn FrameSource) -> f64;
}

/// Opens decodable video sources
#[async_trait]
pub trait MediaOpener: Send + Sync {
    async fn open(
        &self,
        source: &MediaSource,
        file_name: &str,
    ) -> Result<Box<dyn FrameSource>, DomainError>;
}

/// Per-video progress callback, 0..=100
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Batch event observer; every hook defaults to a no-op
pub trait BatchObserver: Send + Sync {
    fn on_status(&self, _job: JobId, _status: JobStatus) {}

    fn on_progress(&self, _job: JobId, _percent: u8) {}

    fn on_batch_progress(&self, _progress: BatchProgress) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}
