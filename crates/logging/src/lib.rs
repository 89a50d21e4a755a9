use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    // RUST_LOG wins when set
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. `log` records from the library crates are
/// forwarded to it as well.
///
/// Returns an error if a global subscriber is already installed.
pub fn try_init_logger() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_line_number(false)
                .with_file(false),
        )
        .with(env_filter())
        .try_init()
}

/// Like [`try_init_logger`], ignoring a second initialisation.
pub fn init_logger() {
    if try_init_logger().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
