//! Video transcription pipeline: probe, seek, transform, re-encode

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{FrameSample, JobOutput};
use crate::domain::rules::{negotiate_video_mime, SampleSchedule, DEFAULT_VIDEO_MIME_PREFERENCES};
use crate::engine::progress::ProgressReporter;
use crate::ports::{
    EncoderFactory, EncoderSettings, FrameRateProbe, FrameSink, FrameSource, ProgressSink,
    Transform,
};

/// Runs one video job end to end
pub struct VideoPipeline {
    transform: Arc<dyn Transform>,
    probe: Arc<dyn FrameRateProbe>,
    encoders: Arc<dyn EncoderFactory>,
    mime_preferences: Vec<String>,
}

impl VideoPipeline {
    pub fn new(
        transform: Arc<dyn Transform>,
        probe: Arc<dyn FrameRateProbe>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> Self {
        Self {
            transform,
            probe,
            encoders,
            mime_preferences: DEFAULT_VIDEO_MIME_PREFERENCES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
        }
    }

    /// Override the codec preference order
    pub fn with_mime_preferences(mut self, preferences: Vec<String>) -> Self {
        self.mime_preferences = preferences;
        self
    }

    /// First preferred mime type the encoder backend supports
    pub fn negotiate(&self) -> Result<&str, DomainError> {
        negotiate_video_mime(&self.mime_preferences, |mime| self.encoders.supports(mime))
    }

    /// Transcode `source`, reporting progress to `progress`.
    ///
    /// The source is closed on every path. On failure no partial output is
    /// returned and the encoder session is discarded.
    pub async fn run(
        &self,
        mut source: Box<dyn FrameSource>,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, DomainError> {
        let result = self.transcode(source.as_mut(), progress).await;
        source.close().await;
        result
    }

    async fn transcode(
        &self,
        source: &mut dyn FrameSource,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, DomainError> {
        let mime = self.negotiate()?.to_string();
        let metadata = source.metadata().clone();

        let fps = self.probe.estimate(source).await;
        let schedule = SampleSchedule::new(metadata.duration, fps)?;
        info!(
            "Transcoding {}x{} {:.3}s video at {:.3} fps ({} samples) as {}",
            metadata.width,
            metadata.height,
            metadata.duration,
            fps,
            schedule.sample_count(),
            mime
        );

        let mut sink = self
            .encoders
            .open(EncoderSettings {
                mime,
                width: metadata.width,
                height: metadata.height,
                frame_rate: fps,
            })
            .await?;

        let mut reporter = ProgressReporter::new(progress);
        if let Err(e) = self
            .encode_frames(source, sink.as_mut(), schedule, &mut reporter)
            .await
        {
            warn!("Aborting encoder session: {}", e);
            sink.abort().await;
            return Err(e);
        }

        match sink.finish().await {
            Ok(output) => {
                reporter.complete();
                info!("Encoded {} bytes as {}", output.len(), output.mime);
                Ok(output)
            }
            Err(e) => {
                sink.abort().await;
                Err(e)
            }
        }
    }

    async fn encode_frames(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        schedule: SampleSchedule,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<(), DomainError> {
        if let Some(track) = source.audio_track() {
            debug!("Attaching audio stream {}", track.stream_index);
            sink.attach_audio(track).await?;
        }

        let duration = schedule.duration();
        for tick in schedule {
            source.seek(tick.timestamp).await?;
            let sample = FrameSample {
                index: tick.index,
                timestamp: tick.timestamp,
                frame: source.read_frame().await?,
            };

            let transformed = self.transform.transform(sample.frame).await.map_err(|e| {
                let detail = match e {
                    DomainError::Transform(msg) => msg,
                    other => other.to_string(),
                };
                DomainError::Transform(format!(
                    "frame {} at {:.3}s: {}",
                    sample.index, sample.timestamp, detail
                ))
            })?;

            sink.push_frame(transformed, sample.timestamp).await?;
            reporter.frame_done(sample.timestamp, duration);
        }

        Ok(())
    }
}
