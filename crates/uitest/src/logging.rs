//! Tracing bootstrap for suite runs.

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber with `RUST_LOG`-style filtering.
///
/// Defaults to `info` when no filter is set. Safe to call from every test;
/// installs exactly once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
