// No-media adapter - Backend used when the binary is built without FFmpeg

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::model::MediaSource;
use crate::ports::{EncoderFactory, EncoderSettings, FrameSink, FrameSource, MediaOpener};

const MISSING_BACKEND: &str = "video support requires building with the `ffmpeg` feature";

/// Opener and encoder factory that support nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMediaBackend;

#[async_trait]
impl MediaOpener for NoMediaBackend {
    async fn open(
        &self,
        _source: &MediaSource,
        file_name: &str,
    ) -> Result<Box<dyn FrameSource>, DomainError> {
        Err(DomainError::UnsupportedCapability(format!(
            "Cannot open {}: {}",
            file_name, MISSING_BACKEND
        )))
    }
}

#[async_trait]
impl EncoderFactory for NoMediaBackend {
    fn supports(&self, _mime: &str) -> bool {
        false
    }

    async fn open(&self, settings: EncoderSettings) -> Result<Box<dyn FrameSink>, DomainError> {
        Err(DomainError::UnsupportedCapability(format!(
            "Cannot encode {}: {}",
            settings.mime, MISSING_BACKEND
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_video_is_unsupported() {
        let backend = NoMediaBackend;
        let source = MediaSource::from_bytes(vec![0; 16]);
        let err = MediaOpener::open(&backend, &source, "clip.mp4")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::UnsupportedCapability(_)));
        assert!(!backend.supports("video/webm"));
    }
}
