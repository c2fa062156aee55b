//! # Metrics
//!
//! Counters and histograms are recorded inline with the `metrics` facade
//! where the work happens; this module installs the Prometheus exporter and
//! keeps the derived gauges current.
//!
//! **Counters:**
//! - `dispatch_orders_ingested_total{source}` - Orders new to the engine
//! - `dispatch_assignments_total{reason}` - Assignments by trigger
//! - `dispatch_transitions_total{to}` - Accepted disposition updates
//! - `dispatch_conflict_retries_total` - Version conflicts retried
//!
//! **Histograms:**
//! - `dispatch_sweep_duration_seconds` - Sweep cycle duration
//!
//! **Gauges:**
//! - `dispatch_queue_size{caller}` - Orders in each caller's queue, active or not
//! - `dispatch_callers_active` - Callers eligible for new orders

use crate::config::MetricsConfig;
use crate::store::QueueStats;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;

/// Buckets for sweep duration, in seconds.
const SWEEP_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Install the global recorder with a Prometheus scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn install_exporter(config: &MetricsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = config.listen.parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("dispatch_sweep_duration_seconds".to_string()),
            SWEEP_BUCKETS,
        )?
        .install()?;

    describe_metrics();
    tracing::info!(addr = %addr, "Prometheus exporter listening");
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(
        "dispatch_orders_ingested_total",
        "Orders ingested for the first time"
    );
    metrics::describe_counter!(
        "dispatch_assignments_total",
        "Orders assigned to a caller, by trigger"
    );
    metrics::describe_counter!(
        "dispatch_transitions_total",
        "Accepted disposition updates, by target state"
    );
    metrics::describe_counter!(
        "dispatch_conflict_retries_total",
        "Optimistic concurrency conflicts retried"
    );
    metrics::describe_histogram!(
        "dispatch_sweep_duration_seconds",
        metrics::Unit::Seconds,
        "Duration of one requeue sweep cycle"
    );
    metrics::describe_gauge!("dispatch_queue_size", "Orders in a caller's queue");
    metrics::describe_gauge!("dispatch_callers_active", "Callers eligible for new orders");
}

/// Publish queue sizes for every known caller and the active head count.
pub fn record_queue_gauges(stats: &[QueueStats], active_callers: usize) {
    metrics::gauge!("dispatch_callers_active").set(active_callers as f64);
    for s in stats {
        metrics::gauge!("dispatch_queue_size", "caller" => s.caller_id.clone()).set(s.size as f64);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
    use std::sync::{Mutex, Once};

    static INIT: Once = Once::new();
    static TEST_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    /// Handle to the process-wide recorder, installed on first use.
    pub(crate) fn handle() -> PrometheusHandle {
        INIT.call_once(|| {
            // build_recorder doesn't need a runtime
            let recorder = PrometheusBuilder::new().build_recorder();
            *TEST_HANDLE.lock().unwrap() = Some(recorder.handle());
            metrics::set_global_recorder(Box::new(recorder)).ok();
        });

        TEST_HANDLE.lock().unwrap().as_ref().unwrap().clone()
    }
}
