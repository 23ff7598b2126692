//! Tracing initialization for the harness binaries.
//!
//! Console-only: benchmark runs are short-lived and their primary output is
//! the timings log, so there is no trace exporter here. Verbosity is
//! controlled through `RUST_LOG`, defaulting to INFO.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Must be called once, before any other harness code runs.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}
