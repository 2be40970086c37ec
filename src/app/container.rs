use std::sync::Arc;

use tracing::debug;
#[cfg(feature = "ffmpeg")]
use tracing::warn;

use crate::adapters::toml_config::AppConfig;
use crate::adapters::{NoMediaBackend, RegionFillTransform};
use crate::app::intake::Intake;
use crate::app::processor::JobProcessor;
use crate::app::scheduler::BatchScheduler;
use crate::engine::SamplingFrameRateProbe;
use crate::output::PackagingService;
use crate::ports::{BatchObserver, EncoderFactory, FrameRateProbe, MediaOpener, Transform};

pub trait AppContainer: Send + Sync {
    fn scheduler(&self) -> Arc<BatchScheduler>;
    fn intake(&self) -> Arc<Intake>;
    fn packaging(&self) -> Arc<PackagingService>;
    fn transform(&self) -> Arc<dyn Transform>;
}

/// Video decoding and encoding ports
#[derive(Clone)]
pub struct MediaBackend {
    pub opener: Arc<dyn MediaOpener>,
    pub encoders: Arc<dyn EncoderFactory>,
}

impl MediaBackend {
    /// FFmpeg when initialisable, otherwise no video support
    #[cfg(feature = "ffmpeg")]
    pub fn detect() -> Self {
        match crate::adapters::LibavMediaBackend::new() {
            Ok(backend) => {
                debug!("Using FFmpeg media backend");
                let backend = Arc::new(backend);
                Self {
                    opener: Arc::clone(&backend) as Arc<dyn MediaOpener>,
                    encoders: backend as Arc<dyn EncoderFactory>,
                }
            }
            Err(e) => {
                warn!("FFmpeg unavailable, video jobs will fail: {}", e);
                Self::unavailable()
            }
        }
    }

    #[cfg(not(feature = "ffmpeg"))]
    pub fn detect() -> Self {
        debug!("Built without a media backend");
        Self::unavailable()
    }

    pub fn unavailable() -> Self {
        Self {
            opener: Arc::new(NoMediaBackend),
            encoders: Arc::new(NoMediaBackend),
        }
    }
}

pub struct DefaultAppContainer {
    scheduler: Arc<BatchScheduler>,
    intake: Arc<Intake>,
    packaging: Arc<PackagingService>,
    transform: Arc<dyn Transform>,
}

impl DefaultAppContainer {
    /// Wire the reference transform and the detected media backend
    pub fn new(config: &AppConfig, observer: Arc<dyn BatchObserver>) -> Self {
        Self::from_parts(
            config,
            Arc::new(RegionFillTransform::new()),
            MediaBackend::detect(),
            observer,
        )
    }

    pub fn from_parts(
        config: &AppConfig,
        transform: Arc<dyn Transform>,
        media: MediaBackend,
        observer: Arc<dyn BatchObserver>,
    ) -> Self {
        let probe: Arc<dyn FrameRateProbe> =
            Arc::new(SamplingFrameRateProbe::new(config.probe.clone()));

        let processor = JobProcessor::new(
            Arc::clone(&transform),
            probe,
            media.encoders,
            media.opener,
        )
        .with_mime_preferences(config.encoder.preferences.clone());

        let scheduler = BatchScheduler::new(Arc::new(processor))
            .with_concurrency(config.scheduler.concurrency)
            .with_observer(observer);

        Self {
            scheduler: Arc::new(scheduler),
            intake: Arc::new(Intake::new(config.limits.clone())),
            packaging: Arc::new(PackagingService::new(config.archive.prefix.clone())),
            transform,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn scheduler(&self) -> Arc<BatchScheduler> {
        Arc::clone(&self.scheduler)
    }

    fn intake(&self) -> Arc<Intake> {
        Arc::clone(&self.intake)
    }

    fn packaging(&self) -> Arc<PackagingService> {
        Arc::clone(&self.packaging)
    }

    fn transform(&self) -> Arc<dyn Transform> {
        Arc::clone(&self.transform)
    }
}
