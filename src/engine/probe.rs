//! Frame-rate discovery by sampling presented frames

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::ports::{FrameRateProbe, FrameSource};

/// Sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Frame events to collect
    pub samples: usize,
    /// Give up after this many milliseconds
    pub timeout_ms: u64,
    /// Rate assumed when sampling is unsupported or times out
    pub default_fps: f64,
    /// Trust a container-declared rate instead of sampling
    pub prefer_metadata: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            samples: 10,
            timeout_ms: 2000,
            default_fps: 30.0,
            prefer_metadata: true,
        }
    }
}

/// Estimates fps from `samples` presentation events during transient playback
pub struct SamplingFrameRateProbe {
    settings: ProbeSettings,
}

impl SamplingFrameRateProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    async fn sample(&self, source: &mut dyn FrameSource) -> Result<f64, DomainError> {
        let mut first_event: Option<Instant> = None;
        let mut count = 0usize;

        loop {
            source.next_presented_frame().await?;
            let now = Instant::now();
            count += 1;
            let first = *first_event.get_or_insert(now);

            if count >= self.settings.samples {
                let elapsed = now.duration_since(first).as_secs_f64();
                if elapsed <= 0.0 {
                    return Err(DomainError::Decode(
                        "Frame events arrived without measurable spacing".to_string(),
                    ));
                }
                return Ok(count as f64 / elapsed);
            }
        }
    }
}

impl Default for SamplingFrameRateProbe {
    fn default() -> Self {
        Self::new(ProbeSettings::default())
    }
}

#[async_trait]
impl FrameRateProbe for SamplingFrameRateProbe {
    async fn estimate(&self, source: &mut dyn FrameSource) -> f64 {
        if self.settings.prefer_metadata {
            if let Some(fps) = source.metadata().declared_frame_rate {
                debug!("Using declared frame rate {:.3}", fps);
                return fps;
            }
        }

        if let Err(e) = source.start_playback().await {
            debug!("Frame sampling unavailable ({}), assuming {} fps", e, self.settings.default_fps);
            return self.settings.default_fps;
        }

        let timeout = Duration::from_millis(self.settings.timeout_ms);
        let sampled = tokio::time::timeout(timeout, self.sample(source)).await;
        source.stop_playback().await;

        match sampled {
            Ok(Ok(fps)) if fps.is_finite() && fps > 0.0 => {
                debug!("Sampled frame rate {:.3}", fps);
                fps
            }
            Ok(Ok(fps)) => {
                warn!("Discarding implausible sampled frame rate {}", fps);
                self.settings.default_fps
            }
            Ok(Err(e)) => {
                warn!("Frame sampling failed: {}", e);
                self.settings.default_fps
            }
            Err(_) => {
                debug!(
                    "Fewer than {} frames within {}ms, assuming {} fps",
                    self.settings.samples, self.settings.timeout_ms, self.settings.default_fps
                );
                self.settings.default_fps
            }
        }
    }
}
