#![allow(dead_code)]

//! Mock ports shared by the integration tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::Rgba;

use unmark::domain::errors::DomainError;
use unmark::domain::model::{
    AudioTrack, BatchProgress, Frame, JobId, JobOutput, JobStatus, MediaSource, Position,
    VideoMetadata, WatermarkInfo,
};
use unmark::engine::image::encode_png;
use unmark::ports::{
    BatchObserver, EncoderFactory, EncoderSettings, FrameRateProbe, FrameSink, FrameSource,
    MediaOpener, Transform,
};

/// Encoded PNG of a uniform image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_png(&Frame::from_pixel(width, height, Rgba([10, 20, 30, 255]))).unwrap()
}

/// Transform that copies frames, optionally failing on the n-th call or on a
/// poisoned frame width, and tracks how many calls overlap
#[derive(Default)]
pub struct TestTransform {
    pub fail_on_call: Option<usize>,
    pub poison_width: Option<u32>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl TestTransform {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Transform for TestTransform {
    async fn transform(&self, frame: Frame) -> Result<Frame, DomainError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on_call == Some(call) {
            return Err(DomainError::Transform("model rejected frame".to_string()));
        }
        if self.poison_width == Some(frame.width()) {
            return Err(DomainError::Transform("poisoned frame".to_string()));
        }
        Ok(frame)
    }

    fn watermark_info(&self, width: u32, height: u32) -> WatermarkInfo {
        WatermarkInfo {
            size: 4,
            position: Position {
                x: width.saturating_sub(8),
                y: height.saturating_sub(8),
            },
        }
    }
}

/// Shared record of what a source did
#[derive(Default)]
pub struct SourceLog {
    pub seeks: Mutex<Vec<f64>>,
    pub closed: AtomicBool,
}

/// Video source producing uniform frames at any timestamp
pub struct MockSource {
    pub metadata: VideoMetadata,
    pub audio: Option<AudioTrack>,
    pub fail_seek_at: Option<usize>,
    pub log: Arc<SourceLog>,
}

impl MockSource {
    pub fn new(duration: f64, width: u32, height: u32) -> Self {
        Self {
            metadata: VideoMetadata::new(duration, width, height).unwrap(),
            audio: None,
            fail_seek_at: None,
            log: Arc::new(SourceLog::default()),
        }
    }

    pub fn with_audio(mut self) -> Self {
        self.audio = Some(AudioTrack {
            stream_index: 1,
            codec: Some("opus".to_string()),
            origin: None,
        });
        self
    }
}

#[async_trait]
impl FrameSource for MockSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn audio_track(&self) -> Option<AudioTrack> {
        self.audio.clone()
    }

    async fn seek(&mut self, timestamp: f64) -> Result<(), DomainError> {
        let mut seeks = self.log.seeks.lock().unwrap();
        if self.fail_seek_at == Some(seeks.len()) {
            return Err(DomainError::Decode(format!("seek to {timestamp} failed")));
        }
        seeks.push(timestamp);
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame, DomainError> {
        Ok(Frame::from_pixel(
            self.metadata.width,
            self.metadata.height,
            Rgba([0, 0, 0, 255]),
        ))
    }

    async fn close(&mut self) {
        self.log.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Opened(String),
    Audio,
    Frame(f64),
    Finished,
    Aborted,
}

/// Encoder factory recording every session event; sessions can be made to
/// fail on the n-th pushed frame or on finish
#[derive(Default)]
pub struct MockEncoders {
    pub supported: Vec<String>,
    pub events: Arc<Mutex<Vec<SinkEvent>>>,
    pub fail_push_at: Option<usize>,
    pub fail_finish: bool,
}

impl MockEncoders {
    pub fn supporting(mimes: &[&str]) -> Self {
        Self {
            supported: mimes.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_push_at(mut self, frame: usize) -> Self {
        self.fail_push_at = Some(frame);
        self
    }

    pub fn failing_finish(mut self) -> Self {
        self.fail_finish = true;
        self
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn frame_timestamps(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Frame(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EncoderFactory for MockEncoders {
    fn supports(&self, mime: &str) -> bool {
        self.supported.iter().any(|m| m == mime)
    }

    async fn open(&self, settings: EncoderSettings) -> Result<Box<dyn FrameSink>, DomainError> {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Opened(settings.mime.clone()));
        Ok(Box::new(MockSink {
            mime: settings.mime,
            events: Arc::clone(&self.events),
            frames: 0,
            fail_push_at: self.fail_push_at,
            fail_finish: self.fail_finish,
        }))
    }
}

struct MockSink {
    mime: String,
    events: Arc<Mutex<Vec<SinkEvent>>>,
    frames: usize,
    fail_push_at: Option<usize>,
    fail_finish: bool,
}

#[async_trait]
impl FrameSink for MockSink {
    fn mime(&self) -> &str {
        &self.mime
    }

    async fn attach_audio(&mut self, _track: AudioTrack) -> Result<(), DomainError> {
        if self.frames > 0 {
            return Err(DomainError::Encode("audio after first frame".to_string()));
        }
        self.events.lock().unwrap().push(SinkEvent::Audio);
        Ok(())
    }

    async fn push_frame(&mut self, _frame: Frame, timestamp: f64) -> Result<(), DomainError> {
        if self.fail_push_at == Some(self.frames) {
            return Err(DomainError::Encode(format!("muxer rejected frame at {timestamp}")));
        }
        self.frames += 1;
        self.events.lock().unwrap().push(SinkEvent::Frame(timestamp));
        Ok(())
    }

    async fn finish(&mut self) -> Result<JobOutput, DomainError> {
        if self.fail_finish {
            return Err(DomainError::Encode("trailer write failed".to_string()));
        }
        self.events.lock().unwrap().push(SinkEvent::Finished);
        Ok(JobOutput::new(self.mime.clone(), vec![0x1a; self.frames]))
    }

    async fn abort(&mut self) {
        self.events.lock().unwrap().push(SinkEvent::Aborted);
    }
}

/// Probe returning a fixed rate
pub struct FixedProbe(pub f64);

#[async_trait]
impl FrameRateProbe for FixedProbe {
    async fn estimate(&self, _source: &mut dyn FrameSource) -> f64 {
        self.0
    }
}

/// Opener producing mock sources; names listed in `broken` fail to open and
/// names in `widths` get that frame width
#[derive(Default)]
pub struct MockOpener {
    pub duration: f64,
    pub broken: Vec<String>,
    pub widths: HashMap<String, u32>,
}

#[async_trait]
impl MediaOpener for MockOpener {
    async fn open(
        &self,
        _source: &MediaSource,
        file_name: &str,
    ) -> Result<Box<dyn FrameSource>, DomainError> {
        if self.broken.iter().any(|name| name == file_name) {
            return Err(DomainError::Decode(format!("{file_name} is not a video")));
        }
        let width = self.widths.get(file_name).copied().unwrap_or(32);
        Ok(Box::new(MockSource::new(self.duration, width, 24)))
    }
}

/// Observer recording every event and the number of jobs in Processing
#[derive(Default)]
pub struct RecordingObserver {
    pub statuses: Mutex<HashMap<JobId, Vec<JobStatus>>>,
    pub progress: Mutex<HashMap<JobId, Vec<u8>>>,
    pub batch: Mutex<Vec<BatchProgress>>,
    processing: AtomicUsize,
    pub max_processing: AtomicUsize,
}

impl RecordingObserver {
    pub fn statuses_of(&self, id: JobId) -> Vec<JobStatus> {
        self.statuses
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn processing_now(&self) -> usize {
        self.processing.load(Ordering::SeqCst)
    }
}

impl BatchObserver for RecordingObserver {
    fn on_status(&self, job: JobId, status: JobStatus) {
        if status == JobStatus::Processing {
            let now = self.processing.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_processing.fetch_max(now, Ordering::SeqCst);
        } else if status.is_terminal() {
            self.processing.fetch_sub(1, Ordering::SeqCst);
        }
        self.statuses
            .lock()
            .unwrap()
            .entry(job)
            .or_default()
            .push(status);
    }

    fn on_progress(&self, job: JobId, percent: u8) {
        self.progress
            .lock()
            .unwrap()
            .entry(job)
            .or_default()
            .push(percent);
    }

    fn on_batch_progress(&self, progress: BatchProgress) {
        self.batch.lock().unwrap().push(progress);
    }
}
