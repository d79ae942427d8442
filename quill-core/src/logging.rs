//! Tracing setup for hosts embedding the sync system.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Respects the `QUILL_LOG` environment variable for filtering and
/// defaults to `info` when it is not set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Initialize tracing with an explicit filter string (for tests or
/// embedding hosts that manage their own environment).
pub fn init_tracing_with_filter(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .init();
}
