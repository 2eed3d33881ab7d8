use super::MetricName;
use crate::pipeline::orchestrator::{RunState, StageKind};

pub fn stage_attempt(stage: StageKind) {
    ::metrics::counter!(MetricName::StageAttempts.as_str(), "stage" => stage.as_str()).increment(1);
}

pub fn stage_failure(stage: StageKind) {
    ::metrics::counter!(MetricName::StageFailures.as_str(), "stage" => stage.as_str()).increment(1);
}

pub fn run_completed(state: RunState) {
    ::metrics::counter!(MetricName::RunsCompleted.as_str(), "state" => state.as_str()).increment(1);
}
