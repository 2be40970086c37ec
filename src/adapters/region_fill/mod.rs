// Region fill transform - Reference watermark removal by border interpolation

use async_trait::async_trait;
use image::Rgba;

use crate::domain::errors::DomainError;
use crate::domain::model::{Frame, Position, WatermarkInfo};
use crate::ports::Transform;

/// Frames larger than this in both dimensions carry the large watermark
const LARGE_FRAME_THRESHOLD: u32 = 1024;

/// Replaces the watermark box with a blend of the pixels bordering it.
///
/// The box sits in the bottom-right corner: 48px with a 32px margin, or 96px
/// with a 64px margin when both dimensions exceed 1024.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionFillTransform;

impl RegionFillTransform {
    pub fn new() -> Self {
        Self
    }

    fn geometry(width: u32, height: u32) -> (u32, u32) {
        if width > LARGE_FRAME_THRESHOLD && height > LARGE_FRAME_THRESHOLD {
            (96, 64)
        } else {
            (48, 32)
        }
    }

    /// Fill the watermark box in place
    pub fn fill(frame: &mut Frame, info: WatermarkInfo) {
        let (x0, y0, size) = (info.position.x, info.position.y, info.size);
        let (width, height) = frame.dimensions();

        for dy in 0..size {
            let y = y0 + dy;
            let left = (x0 > 0).then(|| *frame.get_pixel(x0 - 1, y));
            let right = (x0 + size < width).then(|| *frame.get_pixel(x0 + size, y));
            let v = (dy + 1) as f32 / (size + 1) as f32;

            for dx in 0..size {
                let x = x0 + dx;
                let top = (y0 > 0).then(|| *frame.get_pixel(x, y0 - 1));
                let bottom = (y0 + size < height).then(|| *frame.get_pixel(x, y0 + size));
                let u = (dx + 1) as f32 / (size + 1) as f32;

                let horizontal = interpolate(left, right, u);
                let vertical = interpolate(top, bottom, v);
                let pixel = match (horizontal, vertical) {
                    (Some(h), Some(v)) => blend(h, v, 0.5),
                    (Some(p), None) | (None, Some(p)) => p,
                    (None, None) => *frame.get_pixel(x, y),
                };
                frame.put_pixel(x, y, pixel);
            }
        }
    }
}

fn blend(a: Rgba<u8>, b: Rgba<u8>, t: f32) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let value = f32::from(a.0[i]) * (1.0 - t) + f32::from(b.0[i]) * t;
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

fn interpolate(a: Option<Rgba<u8>>, b: Option<Rgba<u8>>, t: f32) -> Option<Rgba<u8>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(blend(a, b, t)),
        (Some(p), None) | (None, Some(p)) => Some(p),
        (None, None) => None,
    }
}

#[async_trait]
impl Transform for RegionFillTransform {
    async fn transform(&self, mut frame: Frame) -> Result<Frame, DomainError> {
        let (width, height) = frame.dimensions();
        let (size, margin) = Self::geometry(width, height);
        if width < size + margin || height < size + margin {
            return Err(DomainError::Transform(format!(
                "{}x{} frame is smaller than the {}px watermark region",
                width, height, size
            )));
        }

        let info = self.watermark_info(width, height);
        tokio::task::spawn_blocking(move || {
            Self::fill(&mut frame, info);
            frame
        })
        .await
        .map_err(|e| DomainError::Transform(format!("Fill task failed: {}", e)))
    }

    fn watermark_info(&self, width: u32, height: u32) -> WatermarkInfo {
        let (size, margin) = Self::geometry(width, height);
        WatermarkInfo {
            size,
            position: Position {
                x: width.saturating_sub(margin + size),
                y: height.saturating_sub(margin + size),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_frame_geometry() {
        let info = RegionFillTransform.watermark_info(800, 600);
        assert_eq!(info.size, 48);
        assert_eq!(info.position, Position { x: 720, y: 520 });
    }

    #[test]
    fn test_large_frame_geometry() {
        let info = RegionFillTransform.watermark_info(2048, 1536);
        assert_eq!(info.size, 96);
        assert_eq!(info.position, Position { x: 1888, y: 1376 });

        // Both dimensions must exceed the threshold
        assert_eq!(RegionFillTransform.watermark_info(2048, 1024).size, 48);
    }

    #[tokio::test]
    async fn test_fill_on_uniform_frame_is_seamless() {
        let mut frame = Frame::from_pixel(200, 150, Rgba([40, 80, 120, 255]));
        let info = RegionFillTransform.watermark_info(200, 150);
        for y in info.position.y..info.position.y + info.size {
            for x in info.position.x..info.position.x + info.size {
                frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }

        let cleaned = RegionFillTransform.transform(frame).await.unwrap();
        assert!(cleaned.pixels().all(|p| *p == Rgba([40, 80, 120, 255])));
    }

    #[tokio::test]
    async fn test_fill_interpolates_between_borders() {
        let mut frame = Frame::from_pixel(200, 150, Rgba([0, 0, 0, 255]));
        let info = RegionFillTransform.watermark_info(200, 150);
        // Right half of the frame bright, starting at the box's right border
        for y in 0..150 {
            for x in (info.position.x + info.size)..200 {
                frame.put_pixel(x, y, Rgba([200, 200, 200, 255]));
            }
        }

        let cleaned = RegionFillTransform.transform(frame).await.unwrap();
        let near_left = cleaned.get_pixel(info.position.x, info.position.y + 24)[0];
        let near_right = cleaned.get_pixel(info.position.x + info.size - 1, info.position.y + 24)[0];
        assert!(near_left < near_right);
    }

    #[tokio::test]
    async fn test_tiny_frame_is_transform_error() {
        let err = RegionFillTransform
            .transform(Frame::new(60, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Transform(_)));
    }
}
