//! Fixed extract -> load -> transform DAG with retries, a load write pool and
//! an all-success trigger rule.

mod scheduler;
mod state;

pub use scheduler::{ScheduleSummary, Scheduler};
pub use state::{RetryPolicy, RunState, StageKind, StageState, TriggerRule};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, ExtractMode};
use crate::pipeline::ingestion::{
    CsvFileExtractor, Extractor, RawLoader, SyntheticExtractor, WritePool,
};
use crate::pipeline::storage::Storage;
use crate::pipeline::tasks::{SeismicTasks, StageOutput};

/// Name of the permit pool guarding raw writes.
pub const LOAD_POOL_NAME: &str = "database_pool";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage: StageKind,
    pub state: StageState,
    pub output: Option<StageOutput>,
}

/// One execution of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct DagRun {
    pub run_id: Uuid,
    pub dag_id: String,
    pub logical_date: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub priority_weight: i32,
    pub state: RunState,
    pub stages: Vec<StageRecord>,
}

impl DagRun {
    pub fn new(dag_id: &str, logical_date: DateTime<Utc>, priority_weight: i32) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            dag_id: dag_id.to_string(),
            logical_date,
            started_at: Utc::now(),
            finished_at: None,
            priority_weight,
            state: RunState::Running,
            stages: StageKind::ALL
                .iter()
                .map(|&stage| StageRecord {
                    stage,
                    state: StageState::Pending,
                    output: None,
                })
                .collect(),
        }
    }

    pub fn stage(&self, kind: StageKind) -> &StageState {
        &self.stages[kind.index()].state
    }

    pub fn output(&self, kind: StageKind) -> Option<&StageOutput> {
        self.stages[kind.index()].output.as_ref()
    }

    fn set_state(&mut self, kind: StageKind, state: StageState) {
        self.stages[kind.index()].state = state;
    }

    fn set_output(&mut self, kind: StageKind, output: StageOutput) {
        self.stages[kind.index()].output = Some(output);
    }

    /// Whether `kind`'s trigger rule holds over its upstream stages.
    pub fn is_runnable(&self, kind: StageKind) -> bool {
        kind.trigger_rule()
            .is_satisfied(kind.upstream().iter().map(|&up| self.stage(up)))
    }

    fn finish(&mut self, cancelled: bool) {
        self.state = if cancelled {
            RunState::Cancelled
        } else if self.stages.iter().all(|s| s.state.is_succeeded()) {
            RunState::Succeeded
        } else {
            RunState::Failed
        };
        self.finished_at = Some(Utc::now());
    }
}

/// The extractor selected by `[extract] mode`, writing to or reading from
/// `[pipeline] raw_path`.
pub fn extractor_for(config: &Config) -> Arc<dyn Extractor> {
    let raw_path = config.pipeline.raw_path.clone();
    match config.extract.mode {
        ExtractMode::Synthetic => Arc::new(SyntheticExtractor::new(
            raw_path,
            config.extract.rows,
            config.extract.seed,
        )),
        ExtractMode::File => Arc::new(CsvFileExtractor::new(raw_path)),
    }
}

pub struct Orchestrator {
    dag_id: String,
    tasks: SeismicTasks,
    retry: RetryPolicy,
    priority_weight: i32,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(dag_id: impl Into<String>, tasks: SeismicTasks, retry: RetryPolicy) -> Self {
        Self {
            dag_id: dag_id.into(),
            tasks,
            retry,
            priority_weight: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// Wire the whole pipeline from configuration.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Self {
        let extractor = extractor_for(config);
        let pool = WritePool::new(LOAD_POOL_NAME, config.orchestrator.load_concurrency);
        let loader = RawLoader::new(storage.clone(), pool);

        let mut tasks = SeismicTasks::new(extractor, loader, storage);
        if let Some(export_path) = &config.pipeline.export_path {
            tasks = tasks.with_export(export_path.clone());
        }

        let retry = RetryPolicy::new(
            config.orchestrator.retries,
            config.orchestrator.retry_delay(),
        );
        Self::new(config.pipeline.dag_id.clone(), tasks, retry)
            .with_priority_weight(config.orchestrator.priority_weight)
    }

    /// Scheduling hint only; it is reported on every run and changes nothing
    /// about the outputs.
    pub fn with_priority_weight(mut self, weight: i32) -> Self {
        self.priority_weight = weight;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    /// Execute the three stages in order and return the finished run.
    ///
    /// Cancellation is observed between stages and while waiting out a retry
    /// delay. A stage whose trigger rule does not hold stays `Pending`.
    pub async fn run_once(&self, logical_date: DateTime<Utc>) -> DagRun {
        let mut run = DagRun::new(&self.dag_id, logical_date, self.priority_weight);
        let span = info_span!("dag_run", dag_id = %self.dag_id, run_id = %run.run_id);

        async {
            info!(
                priority_weight = self.priority_weight,
                "Starting run for logical date {}", logical_date
            );
            let mut cancelled = false;

            for kind in StageKind::ALL {
                if self.cancel.is_cancelled() {
                    warn!("Run cancelled before stage '{}'", kind);
                    cancelled = true;
                    break;
                }
                if !run.is_runnable(kind) {
                    info!("Stage '{}' left pending: upstream did not all succeed", kind);
                    continue;
                }
                if !self.run_stage(kind, &mut run).await {
                    cancelled = true;
                    break;
                }
            }

            run.finish(cancelled);
            crate::metrics::orchestrator::run_completed(run.state);
            match run.state {
                RunState::Succeeded => info!("Run succeeded"),
                RunState::Cancelled => warn!("Run cancelled"),
                _ => error!("Run failed"),
            }
        }
        .instrument(span)
        .await;

        run
    }

    /// Run one stage through its retry budget. Returns `false` if the run was
    /// cancelled while waiting to retry.
    async fn run_stage(&self, kind: StageKind, run: &mut DagRun) -> bool {
        let mut attempt = 1;
        loop {
            run.set_state(kind, StageState::Running { attempt });
            crate::metrics::orchestrator::stage_attempt(kind);

            let result = self
                .tasks
                .execute(kind, run)
                .instrument(info_span!("stage", stage = kind.as_str(), attempt))
                .await;

            match result {
                Ok(output) => {
                    info!("Stage '{}' succeeded on attempt {}", kind, attempt);
                    run.set_output(kind, output);
                    run.set_state(kind, StageState::Succeeded { attempts: attempt });
                    return true;
                }
                Err(e) => {
                    crate::metrics::orchestrator::stage_failure(kind);
                    run.set_state(
                        kind,
                        StageState::Failed {
                            attempts: attempt,
                            error: e.to_string(),
                        },
                    );

                    if !self.retry.should_retry(attempt) {
                        error!(
                            "Stage '{}' failed after {} attempt(s): {}",
                            kind, attempt, e
                        );
                        return true;
                    }

                    warn!(
                        "Stage '{}' attempt {} failed: {}; retrying in {:?}",
                        kind, attempt, e, self.retry.retry_delay
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            warn!("Cancelled while waiting to retry '{}'", kind);
                            return false;
                        }
                        _ = tokio::time::sleep(self.retry.retry_delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
}
