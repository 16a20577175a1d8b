// Logging module for structured logging using the tracing crate

use std::error::Error;

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON lines (or a human-readable format for local development)
/// - Filtering from `RUST_LOG`, defaulting to `info`
/// - Output to stdout for container deployments
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed or the
/// filter directive cannot be parsed.
///
/// # Examples
///
/// ```no_run
/// use imguru::config::LogFormat;
/// use imguru::logging::init_subscriber;
///
/// init_subscriber(LogFormat::Json).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref())?;

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(false)
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    }
}

/// Build the env filter from an optional directive string
pub fn build_filter(directives: Option<&str>) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::new(DEFAULT_LOG_FILTER)),
    }
}
