use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::aggregate::aggregate;
use super::classify::classify;
use super::cleaning::clean;
use crate::constants::ANALYTICS_TABLE;
use crate::error::{PipelineError, Result};
use crate::pipeline::storage::Storage;
use crate::types::{AggregateRow, ClassifiedEvent, RawEvent};

/// Counts from one transform run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformReport {
    pub raw_rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub groups: usize,
    pub table: String,
}

/// Pure part of the transform: clean, classify and aggregate the full raw
/// table.
pub fn compute(raw: &[RawEvent]) -> (Vec<AggregateRow>, TransformReport) {
    let classified: Vec<ClassifiedEvent> = raw.iter().filter_map(clean).map(classify).collect();
    let rows = aggregate(&classified);

    let report = TransformReport {
        raw_rows: raw.len(),
        accepted: classified.len(),
        rejected: raw.len() - classified.len(),
        groups: rows.len(),
        table: ANALYTICS_TABLE.to_string(),
    };
    (rows, report)
}

/// Reads the whole raw table, recomputes the analytics table and swaps it in.
///
/// Nothing is written until the computation is complete, and the write itself
/// is a single atomic replace, so any failure leaves the previous analytics
/// snapshot in place.
pub struct TransformStage {
    storage: Arc<dyn Storage>,
}

impl TransformStage {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn run(&self) -> Result<TransformReport> {
        let started = Instant::now();

        let raw = self.storage.read_raw_events().await.map_err(|e| {
            warn!("transform: could not read raw table: {}", e);
            PipelineError::transform(e)
        })?;

        let (rows, report) = compute(&raw);

        self.storage.replace_analytics(&rows).await.map_err(|e| {
            warn!("transform: analytics replace rolled back: {}", e);
            PipelineError::transform(e)
        })?;

        crate::metrics::transform::record(&report, started.elapsed().as_secs_f64());
        info!(
            raw_rows = report.raw_rows,
            accepted = report.accepted,
            rejected = report.rejected,
            groups = report.groups,
            "transform: {} replaced",
            ANALYTICS_TABLE
        );
        Ok(report)
    }
}
