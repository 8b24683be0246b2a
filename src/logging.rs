//! # Structured Logging Module
//!
//! Environment-aware structured logging for registry mutations and listener
//! fan-out diagnostics. Console output only; the hosting application decides
//! whether to layer file or collector outputs on top.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
/// Set `SCHEMAHUB_LOG_FORMAT=json` for machine-readable output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let json_output = std::env::var("SCHEMAHUB_LOG_FORMAT")
            .map(|format| format == "json")
            .unwrap_or(false);

        let layer = if json_output {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(EnvFilter::new(log_level))
                .boxed()
        };
        let subscriber = tracing_subscriber::registry().with(layer);

        // Use try_init to avoid panic if the host already set a global subscriber
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("SCHEMAHUB_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for registry operations
pub fn log_registry_operation(
    operation: &str,
    registry_id: Option<u64>,
    namespace: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        registry_id = registry_id,
        namespace = namespace,
        status = %status,
        details = details,
        "📚 REGISTRY_OPERATION"
    );
}

/// Log a listener callback failure without interrupting the fan-out
pub fn log_listener_failure(listener: &str, event: &str, service_id: u64, error: &str) {
    tracing::error!(
        listener = %listener,
        event = %event,
        service_id = service_id,
        error = %error,
        "❌ LISTENER_FAILURE"
    );
}
