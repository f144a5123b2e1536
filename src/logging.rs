//! # Structured Logging Module
//!
//! Environment-aware structured logging for long-running migrations. Console
//! output by default, JSON lines when `MIGRATION_LOG_FORMAT=json`.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if use_json_format() {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A subscriber installed by the embedding application wins
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("MIGRATION_ENV")
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

fn use_json_format() -> bool {
    std::env::var("MIGRATION_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log structured data for progress tracker operations
pub fn log_operation_event(operation_id: &str, name: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        operation_id = %operation_id,
        name = %name,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 OPERATION"
    );
}

/// Log structured data for checkpoint store activity
pub fn log_checkpoint_event(action: &str, checkpoint_id: &str, operation_name: Option<&str>) {
    tracing::info!(
        action = %action,
        checkpoint_id = %checkpoint_id,
        operation_name = operation_name,
        timestamp = %Utc::now().to_rfc3339(),
        "💾 CHECKPOINT"
    );
}

/// Log a retry decision made by the recovery orchestrator
pub fn log_retry_event(
    operation_name: &str,
    attempt: u32,
    category: &str,
    delay_ms: u64,
    error: &str,
) {
    tracing::warn!(
        operation_name = %operation_name,
        attempt = attempt,
        category = %category,
        delay_ms = delay_ms,
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "🔁 RETRY"
    );
}
