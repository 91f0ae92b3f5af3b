//! Tracing subscriber initialisation.

use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_LOG_FILTER, LoggingConfig};

/// Install the global `fmt` subscriber filtered by `config.filter`.
///
/// An unparsable filter falls back to [`DEFAULT_LOG_FILTER`] with a warning.
pub fn init(config: &LoggingConfig) {
    let (filter, invalid) = match EnvFilter::try_new(&config.filter) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(err)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(err) = invalid {
        tracing::warn!(error = %err, filter = %config.filter, "invalid log filter, using default");
    }
}
