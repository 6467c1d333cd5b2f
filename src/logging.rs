//! Log subscriber bootstrap for binaries.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the executable.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV_VAR: &str = "STORYLOOM_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Filter directives: `STORYLOOM_LOG`, else `RUST_LOG`, else `warn`.
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs a stderr `fmt` subscriber. A second call is a no-op.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(log_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
