// Adapters - External system implementations

#[cfg(feature = "ffmpeg")]
pub mod exec_libav;
pub mod no_media;
pub mod region_fill;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
#[cfg(feature = "ffmpeg")]
pub use exec_libav::LibavMediaBackend;
pub use no_media::NoMediaBackend;
pub use region_fill::RegionFillTransform;
pub use toml_config::AppConfig;
pub use tracing_log::init_logging;
