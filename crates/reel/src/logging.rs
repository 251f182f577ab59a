//! Logging initialization.
//!
//! Structured logging via the `tracing` ecosystem. All log output goes to
//! stderr; stdout is reserved for command output (job listings).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `verbose` raises the default level from INFO to DEBUG; the `RUST_LOG`
/// environment variable overrides both. `json_format` switches from
/// pretty-printed lines to JSON for machine parsing.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
