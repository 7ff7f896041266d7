//! Tracing subscriber setup.

use mirror_core::MirrorError;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter from `RUST_LOG`, or from the configured level if unset.
pub fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global fmt subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), MirrorError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .try_init()
        .map_err(|e| MirrorError::Other(format!("logging already initialised: {e}")))
}
