//! Form session example binary
//!
//! Runs the scripted session against in-memory storage, then prints the
//! event log as JSON and the collected Prometheus metrics.
//!
//! Storage is the in-memory double from `formlog-testing`; nothing is written
//! to disk and the saved form is gone when the process exits.

use anyhow::Context;
use form_session::run_scenario;
use formlog_core::environment::SystemClock;
use formlog_runtime::metrics::MetricsRecorder;
use formlog_runtime::{FormStore, SessionConfig};
use formlog_testing::InMemoryStorage;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let config = SessionConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut recorder = MetricsRecorder::new();
    recorder.install().context("installing metrics recorder")?;

    tracing::info!(
        storage_key = %config.storage_key,
        autosave = config.autosave,
        "Starting form session"
    );

    let store = FormStore::for_form(
        &config,
        Arc::new(SystemClock),
        Arc::new(InMemoryStorage::new()),
    );

    run_scenario(&store).context("running form session")?;

    let data = store.state(|s| s.data());
    println!("=== Final form ===\n{data}\n");

    let log = store.event_log().to_json().context("exporting event log")?;
    println!("=== Event log ===\n{log}\n");

    if let Some(metrics) = recorder.render() {
        println!("=== Metrics ===\n{metrics}");
    }

    Ok(())
}
