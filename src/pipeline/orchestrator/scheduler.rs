use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::{Orchestrator, RunState};

/// Tally of the runs a scheduler loop performed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub runs: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub cancelled: u32,
}

/// Fires a run every interval. Runs never overlap: a tick that lands while a
/// run is still going is skipped rather than queued.
pub struct Scheduler {
    orchestrator: Orchestrator,
    every: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Orchestrator, every: Duration) -> Self {
        Self {
            orchestrator,
            every,
        }
    }

    /// Loop until the orchestrator's cancellation token fires or `max_runs`
    /// runs have finished. The first run starts immediately.
    pub async fn run(&self, max_runs: Option<u32>) -> ScheduleSummary {
        let cancel = self.orchestrator.cancellation_token();
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut summary = ScheduleSummary::default();
        info!(
            dag_id = self.orchestrator.dag_id(),
            "Scheduler started, interval {:?}", self.every
        );

        loop {
            if max_runs.is_some_and(|max| summary.runs >= max) {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let run = self.orchestrator.run_once(Utc::now()).await;
            summary.runs += 1;
            match run.state {
                RunState::Succeeded => summary.succeeded += 1,
                RunState::Cancelled => summary.cancelled += 1,
                _ => summary.failed += 1,
            }
            if run.state == RunState::Cancelled {
                break;
            }
        }

        if cancel.is_cancelled() {
            warn!("Scheduler stopped by cancellation after {} run(s)", summary.runs);
        } else {
            info!("Scheduler finished after {} run(s)", summary.runs);
        }
        summary
    }
}
