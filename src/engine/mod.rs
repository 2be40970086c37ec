//! Processing engines for image and video jobs

pub mod image;
pub mod pipeline;
pub mod probe;
pub mod progress;

pub use self::image::ImageProcessor;
pub use pipeline::VideoPipeline;
pub use probe::{ProbeSettings, SamplingFrameRateProbe};
pub use progress::ProgressReporter;
