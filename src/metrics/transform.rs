use super::MetricName;
use crate::pipeline::processing::TransformReport;

pub fn record(report: &TransformReport, duration_secs: f64) {
    ::metrics::counter!(MetricName::TransformRowsAccepted.as_str())
        .increment(report.accepted as u64);
    ::metrics::counter!(MetricName::TransformRowsRejected.as_str())
        .increment(report.rejected as u64);
    ::metrics::gauge!(MetricName::TransformGroups.as_str()).set(report.groups as f64);
    ::metrics::histogram!(MetricName::TransformDuration.as_str()).record(duration_secs);
}
