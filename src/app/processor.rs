// Job processor - Dispatches a job to the image or video engine by kind

use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::model::{JobKind, JobOutput, MediaSource};
use crate::engine::{ImageProcessor, VideoPipeline};
use crate::ports::{EncoderFactory, FrameRateProbe, MediaOpener, ProgressSink, Transform};

/// Processes a single job of either kind
pub struct JobProcessor {
    images: ImageProcessor,
    pipeline: VideoPipeline,
    opener: Arc<dyn MediaOpener>,
}

impl JobProcessor {
    /// Create new processor with injected ports
    pub fn new(
        transform: Arc<dyn Transform>,
        probe: Arc<dyn FrameRateProbe>,
        encoders: Arc<dyn EncoderFactory>,
        opener: Arc<dyn MediaOpener>,
    ) -> Self {
        Self {
            images: ImageProcessor::new(Arc::clone(&transform)),
            pipeline: VideoPipeline::new(transform, probe, encoders),
            opener,
        }
    }

    /// Override the video codec preference order
    pub fn with_mime_preferences(mut self, preferences: Vec<String>) -> Self {
        self.pipeline = self.pipeline.with_mime_preferences(preferences);
        self
    }

    pub async fn process(
        &self,
        kind: JobKind,
        source: &MediaSource,
        file_name: &str,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, DomainError> {
        match kind {
            JobKind::Image => self.images.process(source).await,
            JobKind::Video => {
                // Fail before staging or decoding anything the runtime cannot encode
                self.pipeline.negotiate()?;
                let frames = self.opener.open(source, file_name).await?;
                self.pipeline.run(frames, progress).await
            }
        }
    }
}
