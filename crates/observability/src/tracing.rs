//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the hosting process.
///
/// Structured JSON output, filter level taken from `RUST_LOG` (default
/// `info`). Safe to call multiple times; only the first call installs a
/// subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
