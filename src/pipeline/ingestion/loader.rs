use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::csv::{read_records, Record};
use super::write_pool::WritePool;
use crate::constants::{RAW_COLUMNS, RAW_TABLE};
use crate::error::{PipelineError, Result};
use crate::pipeline::storage::Storage;
use crate::types::RawEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub rows: usize,
}

/// Fails unless the header record names the raw columns in order.
pub fn check_header(header: &Record) -> Result<()> {
    let columns: Vec<&str> = header
        .fields
        .iter()
        .map(|c| c.trim_start_matches('\u{feff}').trim())
        .collect();
    if columns == RAW_COLUMNS {
        Ok(())
    } else {
        Err(PipelineError::MalformedRaw {
            line: header.line,
            message: format!("expected header {:?}, found {:?}", RAW_COLUMNS, columns),
        })
    }
}

/// Splits a raw resource into its checked header and the data records.
pub fn split_header(contents: &str) -> Result<(Record, Vec<Record>)> {
    let mut records = read_records(contents).into_iter();
    let header = records.next().ok_or(PipelineError::MalformedRaw {
        line: 1,
        message: "resource has no header".to_string(),
    })?;
    check_header(&header)?;
    Ok((header, records.collect()))
}

/// Parses the raw CSV without touching any text column.
///
/// Only `depth_km` and `tsunami_flag` are typed. The feed guarantees them, so
/// a bad value there means the resource itself is broken and the whole load
/// fails.
pub fn parse_raw_csv(contents: &str) -> Result<Vec<RawEvent>> {
    let (_, records) = split_header(contents)?;

    let mut events = Vec::with_capacity(records.len());
    for record in records {
        let line_no = record.line;
        if record.fields.len() != RAW_COLUMNS.len() {
            return Err(PipelineError::MalformedRaw {
                line: line_no,
                message: format!(
                    "expected {} fields, found {}",
                    RAW_COLUMNS.len(),
                    record.fields.len()
                ),
            });
        }
        let mut fields = record.fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        let event_id = next();
        let time = next();
        let latitude = next();
        let longitude = next();
        let magnitude_raw = next();
        let depth_raw = next();
        let flag_raw = next();

        let depth_km = depth_raw
            .trim()
            .parse::<f64>()
            .map_err(|_| PipelineError::MalformedRaw {
                line: line_no,
                message: format!("depth_km '{}' is not numeric", depth_raw),
            })?;
        let tsunami_flag = flag_raw
            .trim()
            .parse::<i64>()
            .map_err(|_| PipelineError::MalformedRaw {
                line: line_no,
                message: format!("tsunami_flag '{}' is not an integer", flag_raw),
            })?;

        events.push(RawEvent {
            event_id,
            time,
            latitude,
            longitude,
            magnitude_raw,
            depth_km,
            tsunami_flag,
        });
    }
    Ok(events)
}

/// Loads a raw resource into the raw store under the write pool.
pub struct RawLoader {
    storage: Arc<dyn Storage>,
    pool: WritePool,
}

impl RawLoader {
    pub fn new(storage: Arc<dyn Storage>, pool: WritePool) -> Self {
        Self { storage, pool }
    }

    pub fn pool(&self) -> &WritePool {
        &self.pool
    }

    pub async fn load(&self, location: &Path) -> Result<LoadReport> {
        let contents = tokio::fs::read_to_string(location).await?;
        let events = parse_raw_csv(&contents)?;
        self.load_events(&events).await
    }

    /// Replace the raw table with `events`, holding a pool permit for the
    /// whole write.
    pub async fn load_events(&self, events: &[RawEvent]) -> Result<LoadReport> {
        let _permit = self.pool.acquire().await?;
        debug!(pool = %self.pool.name(), "load: acquired write slot");

        let rows = self.storage.replace_raw_events(events).await?;
        crate::metrics::ingestion::loaded(rows);
        info!("load: {} raw rows written to {}", rows, RAW_TABLE);
        Ok(LoadReport {
            table: RAW_TABLE.to_string(),
            rows,
        })
    }
}
