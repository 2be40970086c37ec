//! Single-shot image jobs: decode once, transform once, encode PNG

use std::io::Cursor;
use std::sync::Arc;

use image::ImageFormat;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{Frame, JobOutput, MediaSource, IMAGE_OUTPUT_MIME};
use crate::ports::Transform;

pub struct ImageProcessor {
    transform: Arc<dyn Transform>,
}

impl ImageProcessor {
    pub fn new(transform: Arc<dyn Transform>) -> Self {
        Self { transform }
    }

    pub async fn process(&self, source: &MediaSource) -> Result<JobOutput, DomainError> {
        let bytes = source.read_all().await?;
        let frame = tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| DomainError::Decode(format!("Decoder task failed: {}", e)))??;
        debug!("Decoded {}x{} image", frame.width(), frame.height());

        let transformed = self.transform.transform(frame).await?;

        let png = tokio::task::spawn_blocking(move || encode_png(&transformed))
            .await
            .map_err(|e| DomainError::Encode(format!("Encoder task failed: {}", e)))??;
        Ok(JobOutput::new(IMAGE_OUTPUT_MIME, png))
    }
}

/// Decode JPEG, PNG or WEBP bytes into an RGBA frame
pub fn decode_image(bytes: &[u8]) -> Result<Frame, DomainError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|e| DomainError::Decode(e.to_string()))
}

/// Encode a frame as PNG
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, DomainError> {
    let mut out = Cursor::new(Vec::new());
    frame
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| DomainError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Position, WatermarkInfo};
    use async_trait::async_trait;
    use image::Rgba;

    struct Invert;

    #[async_trait]
    impl Transform for Invert {
        async fn transform(&self, mut frame: Frame) -> Result<Frame, DomainError> {
            image::imageops::invert(&mut frame);
            Ok(frame)
        }

        fn watermark_info(&self, _width: u32, _height: u32) -> WatermarkInfo {
            WatermarkInfo {
                size: 1,
                position: Position { x: 0, y: 0 },
            }
        }
    }

    fn png_bytes(color: [u8; 4]) -> Vec<u8> {
        encode_png(&Frame::from_pixel(4, 3, Rgba(color))).unwrap()
    }

    #[tokio::test]
    async fn test_image_round_trip_applies_transform() {
        let processor = ImageProcessor::new(Arc::new(Invert));
        let source = MediaSource::from_bytes(png_bytes([10, 20, 30, 255]));

        let output = processor.process(&source).await.unwrap();
        assert_eq!(output.mime, "image/png");

        let decoded = decode_image(&output.data).unwrap();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([245, 235, 225, 255]));
    }

    #[tokio::test]
    async fn test_corrupt_image_is_decode_error() {
        let processor = ImageProcessor::new(Arc::new(Invert));
        let source = MediaSource::from_bytes(b"definitely not an image".to_vec());

        let err = processor.process(&source).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode(_)));
    }
}
