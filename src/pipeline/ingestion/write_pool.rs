use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Bounded set of permits guarding writes to the raw store.
///
/// With the default capacity of one, loads from retries or adjacent runs are
/// serialized and can never interleave their inserts.
#[derive(Debug, Clone)]
pub struct WritePool {
    name: String,
    capacity: u32,
    sem: Arc<Semaphore>,
}

impl WritePool {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            capacity,
            sem: Arc::new(Semaphore::new(capacity as usize)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.sem.available_permits()
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        debug!(pool = %self.name, available = self.available(), "waiting for write slot");
        self.sem
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::PoolClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let pool = WritePool::new("database_pool", 1);
        assert_eq!(pool.available(), 1);
        {
            let _permit = pool.acquire().await.unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(WritePool::new("p", 0).capacity(), 1);
    }
}
