//! Observability setup: structured logging and metrics.
//!
//! This module provides:
//! - `tracing` subscriber initialization (pretty for development, JSON otherwise)
//! - A Prometheus recorder for the `metrics` facade, rendered on demand
//! - Recording helpers used by the pipeline stages
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tracing_subscriber::prelude::*;

use crate::config::ObservabilityConfig;
use crate::model::ValidationResult;

/// Event targets used by the stages in addition to the crate's own module paths
const LOG_TARGETS: &[&str] = &[
    "receipt_preprocessing",
    "receipt_ocr",
    "receipt_parser",
    "receipt_validation",
];

/// Builds the filter: `RUST_LOG` first, then the configured level for this crate.
fn build_filter(config: &ObservabilityConfig) -> Result<tracing_subscriber::EnvFilter> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("pantry_receipts={}", config.log_level).parse()?);
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{}={}", target, config.log_level).parse()?);
    }
    Ok(filter)
}

/// Initialize structured logging with tracing and configuration
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = build_filter(config)?;

    if config.is_development() || config.log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize metrics collection with a Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics collection initialized");
    Ok(handle)
}

/// Record one parsed receipt
pub fn record_parse_metrics(items: usize, needs_review: bool, duration: Duration) {
    metrics::counter!("receipts_parsed_total").increment(1);
    if needs_review {
        metrics::counter!("receipts_needs_review_total").increment(1);
    }
    metrics::histogram!("receipt_items_extracted").record(items as f64);
    metrics::histogram!("receipt_parse_duration_seconds").record(duration.as_secs_f64());
}

/// Record one validation verdict, with a counter per issue code
pub fn record_validation_metrics(result: &ValidationResult) {
    metrics::counter!(
        "receipt_validations_total",
        "result" => if result.is_valid { "valid" } else { "invalid" }
    )
    .increment(1);
    for issue in &result.issues {
        metrics::counter!("receipt_validation_issues_total", "code" => issue.code.as_str()).increment(1);
    }
}

/// Record an OCR call
pub fn record_ocr_metrics(success: bool, duration: Duration) {
    metrics::counter!("ocr_operations_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
    metrics::histogram!("ocr_duration_seconds").record(duration.as_secs_f64());
}

/// Record a full image scan
pub fn record_scan_metrics(success: bool, duration: Duration) {
    metrics::counter!("receipt_scans_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
    metrics::histogram!("receipt_scan_duration_seconds").record(duration.as_secs_f64());
}
