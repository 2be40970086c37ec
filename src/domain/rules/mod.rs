// Domain rules - Frame sampling, progress, codec negotiation and naming policies

use crate::domain::errors::DomainError;
use crate::domain::model::JobKind;

/// Codec preference order used when nothing is configured
pub const DEFAULT_VIDEO_MIME_PREFERENCES: [&str; 4] = [
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
    "video/mp4",
];

/// Slack applied to `duration * fps` before rounding up, so that float noise
/// in a whole number of frames does not produce an extra sample
const SAMPLE_COUNT_TOLERANCE: f64 = 1e-6;

/// Position of one sample within the schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub index: usize,
    pub timestamp: f64,
}

/// Sample times `0, 1/fps, 2/fps, ...` up to and including the duration.
///
/// Each timestamp is derived from its integer index, never accumulated, and the
/// final tick is exactly `duration`.
#[derive(Debug, Clone)]
pub struct SampleSchedule {
    duration: f64,
    interval: f64,
    last_index: usize,
    next_index: usize,
}

impl SampleSchedule {
    /// Build a schedule for a source of `duration` seconds sampled at `fps`
    pub fn new(duration: f64, fps: f64) -> Result<Self, DomainError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::Decode(format!("Invalid duration: {}", duration)));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DomainError::Decode(format!("Invalid frame rate: {}", fps)));
        }

        let last_index = (duration * fps - SAMPLE_COUNT_TOLERANCE).ceil().max(0.0) as usize;
        Ok(Self {
            duration,
            interval: 1.0 / fps,
            last_index,
            next_index: 0,
        })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Total number of samples, `ceil(duration * fps) + 1`
    pub fn sample_count(&self) -> usize {
        self.last_index + 1
    }

    /// Timestamp of the sample at `index`, clamped to the duration
    pub fn timestamp_at(&self, index: usize) -> f64 {
        if index >= self.last_index {
            return self.duration;
        }
        (index as f64 * self.interval).min(self.duration)
    }
}

impl Iterator for SampleSchedule {
    type Item = FrameTick;

    fn next(&mut self) -> Option<FrameTick> {
        if self.next_index > self.last_index {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        Some(FrameTick {
            index,
            timestamp: self.timestamp_at(index),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last_index + 1).saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleSchedule {}

/// Whole-percent progress for a sample at `timestamp` within `duration`
pub fn progress_percent(timestamp: f64, duration: f64) -> u8 {
    if duration <= 0.0 {
        return 100;
    }
    (timestamp / duration * 100.0).floor().clamp(0.0, 100.0) as u8
}

/// Pick the first preferred mime type the encoder backend supports
pub fn negotiate_video_mime<'a, F>(preferences: &'a [String], is_supported: F) -> Result<&'a str, DomainError>
where
    F: Fn(&str) -> bool,
{
    preferences
        .iter()
        .map(String::as_str)
        .find(|mime| is_supported(mime))
        .ok_or_else(|| {
            DomainError::UnsupportedCapability(format!(
                "No supported video encoder among: {}",
                preferences.join(", ")
            ))
        })
}

/// Output entry name: `<prefix>_<base>.<ext>`
pub fn output_entry_name(prefix: &str, base_name: &str, kind: JobKind) -> String {
    format!("{}_{}.{}", prefix, base_name, kind.output_extension())
}

#[cfg(test)]
mod tests;
