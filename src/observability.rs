//! Observability module for centralized tracing setup and metrics recording.
//!
//! The core only records through the `metrics` facade; wiring an exporter
//! (and where its endpoint lives) is the embedding application's concern.

use anyhow::Result;
use std::time::Duration;
use tracing_subscriber::prelude::*;

use crate::product::CaptureMethod;

/// Initialize structured logging with an env-filter.
///
/// Pretty output when `LOG_FORMAT=pretty`, JSON otherwise. Call once from
/// the embedding application; tests and library consumers that install
/// their own subscriber should skip this.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("carrinho_core={}", default_level).parse()?);

    if std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()) == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    }

    tracing::info!(log_level = %default_level, "Tracing initialized");
    Ok(())
}

fn method_label(method: CaptureMethod) -> &'static str {
    match method {
        CaptureMethod::Scanner => "scanner",
        CaptureMethod::Voice => "voice",
        CaptureMethod::Manual => "manual",
    }
}

/// Record the start of a capture attempt
pub fn record_capture_started(method: CaptureMethod) {
    metrics::counter!("capture_attempts_total", "method" => method_label(method)).increment(1);
}

/// Record how a capture attempt ended ("success", "error", "timeout",
/// "cancelled", "fallback")
pub fn record_capture_outcome(method: CaptureMethod, outcome: &'static str) {
    metrics::counter!(
        "capture_outcomes_total",
        "method" => method_label(method),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a recognition result that arrived after timeout, cancel or retry
/// and was discarded
pub fn record_stale_completion_discarded() {
    metrics::counter!("capture_stale_completions_total").increment(1);
}

/// Record price-parse performance
pub fn record_price_parse_metrics(
    duration: Duration,
    text_length: usize,
    matched: bool,
    ambiguous: bool,
) {
    metrics::counter!(
        "price_parse_total",
        "result" => if matched { "matched" } else { "none" }
    )
    .increment(1);
    if ambiguous {
        metrics::counter!("price_parse_ambiguous_total").increment(1);
    }
    metrics::histogram!("price_parse_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("price_parse_text_length").record(text_length as f64);
}

/// Record a validation outcome
pub fn record_validation_metrics(valid: bool, error_count: usize) {
    metrics::counter!(
        "validations_total",
        "result" => if valid { "valid" } else { "invalid" }
    )
    .increment(1);
    if !valid {
        metrics::histogram!("validation_error_count").record(error_count as f64);
    }
}

/// Create a tracing span for a capture session operation
pub fn session_span(operation: &str, session_id: u64) -> tracing::Span {
    tracing::info_span!("capture_session", operation = %operation, session_id = %session_id)
}
