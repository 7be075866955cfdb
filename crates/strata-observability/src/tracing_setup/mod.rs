//! Tracing setup: subscriber installation, span definitions, and event helpers.

pub mod events;
pub mod spans;

use tracing_subscriber::EnvFilter;

/// Env var consulted for the log filter.
pub const LOG_ENV_VAR: &str = "STRATA_LOG";

/// Initialize the tracing subscriber with structured JSON output.
///
/// Respects the `STRATA_LOG` environment variable for filtering.
/// Defaults to `info` level if not set. Does nothing if a global subscriber
/// is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .try_init();
}

/// Initialize tracing with a custom filter string (for testing or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let filter = EnvFilter::new(filter);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .try_init();
}
