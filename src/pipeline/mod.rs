// Seismic ELT pipeline: ingestion, processing, storage and orchestration

pub mod export;
pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;
pub mod tasks;

pub use orchestrator::{DagRun, Orchestrator, Scheduler};
pub use storage::{InMemoryStorage, SqliteStorage, Storage};
