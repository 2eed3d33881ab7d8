//! Pipeline metrics.
//!
//! Recording goes through the `metrics` facade; when no recorder is installed
//! the calls are no-ops, so library code and tests never need to set anything
//! up. The binary installs a Prometheus exporter when a listen address is
//! configured.

pub mod ingestion;
pub mod orchestrator;
pub mod transform;

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Every metric name the pipeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ExtractRows,
    LoadRows,
    TransformRowsAccepted,
    TransformRowsRejected,
    TransformGroups,
    TransformDuration,
    StageAttempts,
    StageFailures,
    RunsCompleted,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ExtractRows => "seismic_extract_rows_total",
            MetricName::LoadRows => "seismic_load_rows_total",
            MetricName::TransformRowsAccepted => "seismic_transform_rows_accepted_total",
            MetricName::TransformRowsRejected => "seismic_transform_rows_rejected_total",
            MetricName::TransformGroups => "seismic_transform_groups",
            MetricName::TransformDuration => "seismic_transform_duration_seconds",
            MetricName::StageAttempts => "seismic_stage_attempts_total",
            MetricName::StageFailures => "seismic_stage_failures_total",
            MetricName::RunsCompleted => "seismic_runs_completed_total",
        }
    }
}

/// Install the Prometheus exporter. Idempotent.
pub fn init_metrics(listen_addr: SocketAddr) {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(listen_addr)
            .install()
        {
            Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", listen_addr),
            Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
        }
    });
}
