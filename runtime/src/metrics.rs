//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the runtime:
//! - Store action processing and rejections
//! - Effect execution
//! - Event log appends, by event type
//! - Storage reads, writes and failures
//!
//! # Example
//!
//! ```rust,no_run
//! use formlog_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! // ... run a session ...
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
///
/// Installs the global `metrics` recorder and renders the collected metrics
/// in the Prometheus text format.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that is not installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Install the Prometheus recorder globally and register metric descriptions.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), installation is
    /// skipped and `render()` returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            // Configure histogram buckets for latency measurements
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                register_metrics();
                tracing::info!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this recorder was not the one installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    // Store Metrics
    describe_counter!(
        "store_actions_processed_total",
        "Total number of actions run through the reducer"
    );
    describe_counter!(
        "store_actions_rejected_total",
        "Total number of actions rejected by the reducer"
    );
    describe_histogram!(
        "store_send_duration_seconds",
        "Time taken to process an action and its effects"
    );

    // Effect Metrics
    describe_counter!(
        "effects_executed_total",
        "Total number of effects executed, by effect type"
    );

    // Event Log Metrics
    describe_counter!(
        "event_log_entries_appended_total",
        "Total number of entries appended to the event log, by event type"
    );

    // Storage Metrics
    describe_counter!("storage_reads_total", "Total number of storage reads");
    describe_counter!("storage_writes_total", "Total number of storage writes");
    describe_counter!(
        "storage_errors_total",
        "Total number of failed storage operations"
    );
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record an action processed.
    pub fn record_action() {
        counter!("store_actions_processed_total").increment(1);
    }

    /// Record a rejected action.
    pub fn record_rejection() {
        counter!("store_actions_rejected_total").increment(1);
    }

    /// Record the duration of a `send` call.
    pub fn record_send(duration: Duration) {
        histogram!("store_send_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Effect metrics recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record an effect execution.
    pub fn record_execution(kind: &'static str) {
        counter!("effects_executed_total", "type" => kind).increment(1);
    }
}

/// Event log metrics recorder.
pub struct EventLogMetrics;

impl EventLogMetrics {
    /// Record an appended entry.
    pub fn record_append(event_type: &'static str) {
        counter!("event_log_entries_appended_total", "type" => event_type).increment(1);
    }
}

/// Storage metrics recorder.
pub struct StorageMetrics;

impl StorageMetrics {
    /// Record a storage read.
    pub fn record_read() {
        counter!("storage_reads_total").increment(1);
    }

    /// Record a storage write.
    pub fn record_write() {
        counter!("storage_writes_total").increment(1);
    }

    /// Record a failed storage operation.
    pub fn record_error() {
        counter!("storage_errors_total").increment(1);
    }
}
