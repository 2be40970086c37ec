// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::adapters::toml_config::LoggingConfig;
use crate::error::{UnmarkError, UnmarkResult};

/// Build the filter: `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> UnmarkResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!("unmark={level},warn")).map_err(|e| {
            UnmarkError::Logging {
                message: format!("Invalid log level {}: {}", level, e),
            }
        }),
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_logging(config: &LoggingConfig) -> UnmarkResult<()> {
    let filter = build_filter(&config.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Already-installed subscribers are left in place
    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    Ok(())
}
