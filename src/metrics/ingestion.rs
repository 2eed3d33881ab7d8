use super::MetricName;

pub fn extracted(rows: usize) {
    ::metrics::counter!(MetricName::ExtractRows.as_str()).increment(rows as u64);
}

pub fn loaded(rows: usize) {
    ::metrics::counter!(MetricName::LoadRows.as_str()).increment(rows as u64);
}
