#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use seismic_elt::error::{PipelineError, Result};
use seismic_elt::pipeline::ingestion::{Extractor, RawLoader, RawResource, WritePool};
use seismic_elt::pipeline::orchestrator::{Orchestrator, RetryPolicy};
use seismic_elt::pipeline::storage::{InMemoryStorage, Storage};
use seismic_elt::pipeline::tasks::SeismicTasks;
use seismic_elt::types::{AggregateRow, RawEvent};

/// Three rows: one clean high-risk Pacific South event, one with a blank
/// latitude and one with an unusable magnitude.
pub const SAMPLE_CSV: &str = "\
event_id,time,latitude,longitude,magnitude_raw,depth_km,tsunami_flag
E1,2025-11-01T04:00:00Z,10,-110,6.5,10.0,1
E2,2025-11-01T05:00:00Z,,-110,5.0,12.0,0
E3,2025-11-01T06:00:00Z,10,-110,N/A,8.0,0
";

/// Writes fixed CSV contents, failing the first `fail_first` calls.
pub struct ScriptedExtractor {
    path: PathBuf,
    contents: String,
    fail_first: u32,
    calls: AtomicU32,
}

impl ScriptedExtractor {
    pub fn new(path: impl Into<PathBuf>, contents: &str) -> Self {
        Self {
            path: path.into(),
            contents: contents.to_string(),
            fail_first: 0,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_first(mut self, n: u32) -> Self {
        self.fail_first = n;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract(&self) -> Result<RawResource> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_first {
            return Err(PipelineError::Extract(format!("feed unavailable (call {call})")));
        }
        tokio::fs::write(&self.path, &self.contents).await?;
        Ok(RawResource {
            location: self.path.clone(),
            rows: self.contents.lines().skip(1).filter(|l| !l.is_empty()).count(),
        })
    }
}

/// In-memory store with switchable faults and a probe on concurrent raw writers.
#[derive(Default)]
pub struct FaultyStorage {
    inner: InMemoryStorage,
    fail_analytics: AtomicBool,
    raw_write_delay: Duration,
    active_raw_writers: AtomicUsize,
    peak_raw_writers: AtomicUsize,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw_write_delay(delay: Duration) -> Self {
        Self {
            raw_write_delay: delay,
            ..Self::default()
        }
    }

    pub fn fail_analytics(&self, fail: bool) {
        self.fail_analytics.store(fail, Ordering::SeqCst);
    }

    pub fn peak_raw_writers(&self) -> usize {
        self.peak_raw_writers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn replace_raw_events(&self, events: &[RawEvent]) -> Result<usize> {
        let active = self.active_raw_writers.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_raw_writers.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(self.raw_write_delay).await;
        let result = self.inner.replace_raw_events(events).await;
        self.active_raw_writers.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn read_raw_events(&self) -> Result<Vec<RawEvent>> {
        self.inner.read_raw_events().await
    }

    async fn replace_analytics(&self, rows: &[AggregateRow]) -> Result<()> {
        if self.fail_analytics.load(Ordering::SeqCst) {
            return Err(PipelineError::Storage("injected analytics fault".to_string()));
        }
        self.inner.replace_analytics(rows).await
    }

    async fn read_analytics(&self) -> Result<Vec<AggregateRow>> {
        self.inner.read_analytics().await
    }
}

pub fn orchestrator(
    extractor: Arc<dyn Extractor>,
    storage: Arc<dyn Storage>,
    retries: u32,
    retry_delay: Duration,
) -> Orchestrator {
    let loader = RawLoader::new(storage.clone(), WritePool::new("database_pool", 1));
    let tasks = SeismicTasks::new(extractor, loader, storage);
    Orchestrator::new("test_pipeline", tasks, RetryPolicy::new(retries, retry_delay))
}
