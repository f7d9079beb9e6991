//! Structured logging setup for keyledger
//!
//! Every layer writes to stderr. Stdout carries nothing but the issued key,
//! so callers can capture it without filtering log lines.

use keyledger_config::LogFormat;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging in the configured format
pub fn init(format: LogFormat, service_name: &str, default_level: &str) {
    match format {
        LogFormat::Json => init_logging(service_name, default_level),
        LogFormat::Console => init_console_logging(service_name, default_level),
    }
}

/// Initialize structured JSON logging
///
/// This sets up:
/// - JSON formatted logs on stderr
/// - Environment-based log level filtering (`RUST_LOG` wins over `default_level`)
pub fn init_logging(service_name: &str, default_level: &str) {
    let env_filter = env_filter(default_level);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init();

    tracing::debug!(service = service_name, "Logging initialized");
}

/// Initialize human-readable console logging on stderr
pub fn init_console_logging(service_name: &str, default_level: &str) {
    let env_filter = env_filter(default_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    tracing::debug!(service = service_name, "Console logging initialized");
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
