//! Logging configuration
//!
//! Initializes tracing for the application. The per-run execution log
//! captured by the engine is separate; tracing carries diagnostics only.

use super::config::Config;

/// Initializes logging with the specified level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .init();
}

/// Initializes logging at the level configured in the environment
///
/// Reads `ROWLINE_LOG` through [`Config::from_env`].
pub fn init_from_env() {
    init_logging(&Config::from_env().log_level);
}
