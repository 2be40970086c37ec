// TOML config adapter - Typed configuration with file, environment and default layers

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::DEFAULT_CONCURRENCY;
use crate::domain::rules::DEFAULT_VIDEO_MIME_PREFERENCES;
use crate::engine::ProbeSettings;
use crate::error::{UnmarkError, UnmarkResult};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "unmark.toml";

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Video mime types in order of preference
    pub preferences: Vec<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            preferences: DEFAULT_VIDEO_MIME_PREFERENCES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
        }
    }
}

/// Archive and output naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: "unmarked".to_string(),
        }
    }
}

/// Intake size limits in bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 20 * 1024 * 1024,
            max_video_bytes: 500 * 1024 * 1024,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub probe: ProbeSettings,
    pub encoder: EncoderConfig,
    pub archive: ArchiveConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> UnmarkResult<Self> {
        toml::from_str(content).map_err(|e| UnmarkError::Config {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> UnmarkResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| UnmarkError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Explicit path, else `unmark.toml` in the working directory, else defaults
    pub fn discover(explicit: Option<&Path>) -> UnmarkResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            return Self::load(&fallback);
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Apply `UNMARK_*` overrides from the process environment
    pub fn apply_env(&mut self) -> UnmarkResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `UNMARK_*` overrides from an arbitrary lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> UnmarkResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = 0;

        if let Some(value) = lookup("UNMARK_CONCURRENCY") {
            self.scheduler.concurrency = parse_env("UNMARK_CONCURRENCY", &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_PROBE_SAMPLES") {
            self.probe.samples = parse_env("UNMARK_PROBE_SAMPLES", &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_PROBE_TIMEOUT_MS") {
            self.probe.timeout_ms = parse_env("UNMARK_PROBE_TIMEOUT_MS", &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_DEFAULT_FPS") {
            self.probe.default_fps = parse_env("UNMARK_DEFAULT_FPS", &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_ENCODER_PREFERENCES") {
            self.encoder.preferences = value
                .split(',')
                .map(str::trim)
                .filter(|mime| !mime.is_empty())
                .map(str::to_string)
                .collect();
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_ARCHIVE_PREFIX") {
            self.archive.prefix = value;
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_LOG_LEVEL") {
            self.logging.level = value;
            overrides += 1;
        }
        if let Some(value) = lookup("UNMARK_LOG_JSON") {
            self.logging.json = parse_env("UNMARK_LOG_JSON", &value)?;
            overrides += 1;
        }

        if overrides > 0 {
            debug!("Applied {} environment overrides", overrides);
        }
        Ok(())
    }

    /// Reject values the scheduler, probe or encoder cannot work with
    pub fn validate(&self) -> UnmarkResult<()> {
        if self.scheduler.concurrency == 0 {
            return Err(config_error("scheduler.concurrency must be at least 1"));
        }
        if self.probe.samples < 2 {
            return Err(config_error("probe.samples must be at least 2"));
        }
        if !self.probe.default_fps.is_finite() || self.probe.default_fps <= 0.0 {
            return Err(config_error("probe.default_fps must be positive"));
        }
        if self.encoder.preferences.is_empty() {
            return Err(config_error("encoder.preferences cannot be empty"));
        }
        if self.archive.prefix.trim().is_empty() {
            return Err(config_error("archive.prefix cannot be empty"));
        }
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(config_error(&format!(
                    "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> UnmarkResult<String> {
        toml::to_string_pretty(self).map_err(|e| UnmarkError::Config {
            message: format!("Failed to serialize config: {}", e),
        })
    }
}

fn config_error(message: &str) -> UnmarkError {
    UnmarkError::Config {
        message: message.to_string(),
    }
}

fn parse_env<T>(key: &str, value: &str) -> UnmarkResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| UnmarkError::Config {
        message: format!("Invalid value for {}: {}", key, e),
    })
}
