use super::traits::Storage;
use crate::constants::{ANALYTICS_TABLE, RAW_TABLE};
use crate::error::{PipelineError, Result};
use crate::types::{AggregateRow, RawEvent};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// In-memory storage implementation for development/testing
///
/// A table that has never been written is `None`, mirroring a missing table in
/// the SQLite store.
#[derive(Default)]
pub struct InMemoryStorage {
    raw_events: Mutex<Option<Vec<RawEvent>>>,
    analytics: Mutex<Option<Vec<AggregateRow>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| PipelineError::Storage("in-memory table lock poisoned".to_string()))
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn replace_raw_events(&self, events: &[RawEvent]) -> Result<usize> {
        let snapshot = events.to_vec();
        *lock(&self.raw_events)? = Some(snapshot);
        debug!("Replaced {} with {} rows", RAW_TABLE, events.len());
        Ok(events.len())
    }

    async fn read_raw_events(&self) -> Result<Vec<RawEvent>> {
        lock(&self.raw_events)?
            .clone()
            .ok_or(PipelineError::MissingTable(RAW_TABLE))
    }

    async fn replace_analytics(&self, rows: &[AggregateRow]) -> Result<()> {
        // Validate the whole snapshot before it becomes visible.
        for row in rows {
            row.check_invariants()
                .map_err(PipelineError::InvariantViolation)?;
        }
        *lock(&self.analytics)? = Some(rows.to_vec());
        debug!("Replaced {} with {} rows", ANALYTICS_TABLE, rows.len());
        Ok(())
    }

    async fn read_analytics(&self) -> Result<Vec<AggregateRow>> {
        Ok(lock(&self.analytics)?.clone().unwrap_or_default())
    }
}
