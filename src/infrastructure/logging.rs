//! Logging configuration
//!
//! Initializes tracing for the application. Log output goes to stderr so
//! `--stdout` conversions stay clean.

/// Initializes logging with the specified level. `RUST_LOG`, when set,
/// takes precedence. Calling it twice is harmless.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .try_init();
}
