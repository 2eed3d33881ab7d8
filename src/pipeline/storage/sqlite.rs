use super::traits::Storage;
use crate::constants::{ANALYTICS_TABLE, RAW_TABLE};
use crate::error::{PipelineError, Result};
use crate::types::{AggregateRow, LocationZone, RawEvent, RiskLevel};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed raw and analytics tables.
///
/// Each replace runs drop, create and insert inside one transaction. SQLite
/// DDL is transactional, so a failed replace rolls back to the previous table.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!("Opened SQLite store at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PipelineError::Storage("SQLite connection lock poisoned".to_string()))
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn to_count(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| PipelineError::Storage(format!("negative {column} in {ANALYTICS_TABLE}")))
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn replace_raw_events(&self, events: &[RawEvent]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS {RAW_TABLE};
            CREATE TABLE {RAW_TABLE} (
                event_id       TEXT,
                time           TEXT,
                latitude       TEXT,
                longitude      TEXT,
                magnitude_raw  TEXT,
                depth_km       REAL,
                tsunami_flag   INTEGER
            );
            "#
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {RAW_TABLE}
                 (event_id, time, latitude, longitude, magnitude_raw, depth_km, tsunami_flag)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ))?;
            for e in events {
                stmt.execute(params![
                    e.event_id,
                    e.time,
                    e.latitude,
                    e.longitude,
                    e.magnitude_raw,
                    e.depth_km,
                    e.tsunami_flag
                ])?;
            }
        }
        tx.commit()?;
        debug!("Replaced {} with {} rows", RAW_TABLE, events.len());
        Ok(events.len())
    }

    async fn read_raw_events(&self) -> Result<Vec<RawEvent>> {
        let conn = self.lock()?;
        if !table_exists(&conn, RAW_TABLE)? {
            return Err(PipelineError::MissingTable(RAW_TABLE));
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT event_id, time, latitude, longitude, magnitude_raw, depth_km, tsunami_flag
             FROM {RAW_TABLE} ORDER BY rowid"
        ))?;
        // Rows written by other loaders may carry NULLs where we write empty text.
        let rows = stmt.query_map([], |row| {
            Ok(RawEvent {
                event_id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                time: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                latitude: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                longitude: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                magnitude_raw: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                depth_km: row.get(5)?,
                tsunami_flag: row.get(6)?,
            })
        })?;
        let mut events = Vec::new();
        for event in rows {
            events.push(event?);
        }
        Ok(events)
    }

    async fn replace_analytics(&self, rows: &[AggregateRow]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS {ANALYTICS_TABLE};
            CREATE TABLE {ANALYTICS_TABLE} (
                event_day             TEXT,
                location_zone         TEXT NOT NULL,
                risk_level            TEXT NOT NULL,
                total_events          INTEGER NOT NULL,
                avg_magnitude         REAL NOT NULL,
                tsunami_alerts_count  INTEGER NOT NULL,
                UNIQUE (event_day, location_zone, risk_level)
            );
            "#
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {ANALYTICS_TABLE}
                 (event_day, location_zone, risk_level,
                  total_events, avg_magnitude, tsunami_alerts_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))?;
            for row in rows {
                // An early return drops `tx`, which rolls everything back.
                row.check_invariants()
                    .map_err(PipelineError::InvariantViolation)?;
                stmt.execute(params![
                    row.event_day.map(|d| d.format(DAY_FORMAT).to_string()),
                    row.location_zone.as_str(),
                    row.risk_level.as_str(),
                    row.total_events as i64,
                    row.avg_magnitude,
                    row.tsunami_alerts_count as i64
                ])?;
            }
        }
        tx.commit()?;
        debug!("Replaced {} with {} rows", ANALYTICS_TABLE, rows.len());
        Ok(())
    }

    async fn read_analytics(&self) -> Result<Vec<AggregateRow>> {
        let conn = self.lock()?;
        if !table_exists(&conn, ANALYTICS_TABLE)? {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT event_day, location_zone, risk_level,
                    total_events, avg_magnitude, tsunami_alerts_count
             FROM {ANALYTICS_TABLE} ORDER BY rowid"
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let day: Option<String> = row.get(0)?;
            let zone: String = row.get(1)?;
            let risk: String = row.get(2)?;
            let event_day = match day {
                Some(d) => Some(NaiveDate::parse_from_str(&d, DAY_FORMAT).map_err(|e| {
                    PipelineError::Storage(format!("bad event_day '{d}' in {ANALYTICS_TABLE}: {e}"))
                })?),
                None => None,
            };
            out.push(AggregateRow {
                event_day,
                location_zone: LocationZone::parse(&zone).ok_or_else(|| {
                    PipelineError::Storage(format!("unknown location_zone '{zone}'"))
                })?,
                risk_level: RiskLevel::parse(&risk)
                    .ok_or_else(|| PipelineError::Storage(format!("unknown risk_level '{risk}'")))?,
                total_events: to_count(row.get(3)?, "total_events")?,
                avg_magnitude: row.get(4)?,
                tsunami_alerts_count: to_count(row.get(5)?, "tsunami_alerts_count")?,
            });
        }
        Ok(out)
    }
}
