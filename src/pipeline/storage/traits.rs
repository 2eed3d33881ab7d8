use crate::error::Result;
use crate::types::{AggregateRow, RawEvent};
use async_trait::async_trait;

/// Persistence for the two tables the pipeline owns.
///
/// Both `replace_*` operations have drop-and-recreate semantics and must be
/// all-or-nothing: when they return an error the previous contents of that
/// table are still visible, untouched.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create-or-replace the raw table and bulk insert `events` verbatim.
    async fn replace_raw_events(&self, events: &[RawEvent]) -> Result<usize>;
    async fn read_raw_events(&self) -> Result<Vec<RawEvent>>;

    /// Create-or-replace the analytics table with `rows`.
    async fn replace_analytics(&self, rows: &[AggregateRow]) -> Result<()>;
    async fn read_analytics(&self) -> Result<Vec<AggregateRow>>;
}
