mod common;

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

use common::{orchestrator, ScriptedExtractor, SAMPLE_CSV};
use seismic_elt::config::{Config, ExtractMode};
use seismic_elt::constants::ANALYTICS_COLUMNS;
use seismic_elt::pipeline::ingestion::{RawLoader, WritePool};
use seismic_elt::pipeline::orchestrator::{Orchestrator, RunState, StageKind};
use seismic_elt::pipeline::storage::{InMemoryStorage, SqliteStorage, Storage};
use seismic_elt::pipeline::tasks::StageOutput;
use seismic_elt::types::{LocationZone, RiskLevel};
use tempfile::tempdir;

fn synthetic_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.pipeline.database = root.join("seismic.db");
    config.pipeline.raw_path = root.join("raw").join("events.csv");
    config.pipeline.export_path = Some(root.join("analytics").join("risk.csv"));
    config.pipeline.log_dir = root.join("logs");
    config.extract.mode = ExtractMode::Synthetic;
    config.extract.rows = 300;
    config.extract.seed = Some(7);
    config.orchestrator.retries = 0;
    config.orchestrator.retry_delay_secs = 0;
    config
}

fn open_sqlite(config: &Config) -> Arc<dyn Storage> {
    Arc::new(SqliteStorage::open(&config.pipeline.database).unwrap())
}

#[tokio::test]
async fn sample_feed_yields_single_high_risk_group() {
    let dir = tempdir().unwrap();
    let extractor = Arc::new(ScriptedExtractor::new(dir.path().join("raw.csv"), SAMPLE_CSV));
    let storage = Arc::new(InMemoryStorage::new());
    let orch = orchestrator(extractor, storage.clone(), 0, Duration::ZERO);

    let run = orch.run_once(Utc::now()).await;
    assert_eq!(run.state, RunState::Succeeded);

    // Raw rows are stored verbatim, defects included.
    let raw = storage.read_raw_events().await.unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw[1].latitude, "");
    assert_eq!(raw[2].magnitude_raw, "N/A");

    let rows = storage.read_analytics().await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.event_day, NaiveDate::from_ymd_opt(2025, 11, 1));
    assert_eq!(row.location_zone, LocationZone::PacificSouth);
    assert_eq!(row.risk_level, RiskLevel::High);
    assert_eq!(row.total_events, 1);
    assert_eq!(row.avg_magnitude, 6.5);
    assert_eq!(row.tsunami_alerts_count, 1);
}

#[tokio::test]
async fn configured_pipeline_runs_against_sqlite_and_exports() {
    let dir = tempdir().unwrap();
    let config = synthetic_config(dir.path());
    let storage = open_sqlite(&config);
    let orch = Orchestrator::from_config(&config, storage.clone());

    let run = orch.run_once(Utc::now()).await;
    assert_eq!(run.state, RunState::Succeeded, "{run:?}");
    assert_eq!(run.priority_weight, 100);

    let raw = storage.read_raw_events().await.unwrap();
    assert_eq!(raw.len(), 300);

    let rows = storage.read_analytics().await.unwrap();
    assert!(!rows.is_empty());
    for row in &rows {
        row.check_invariants().unwrap();
    }

    let accepted = match run.output(StageKind::Transform) {
        Some(StageOutput::Transformed(report)) => report.accepted,
        other => panic!("unexpected transform output {other:?}"),
    };
    let total: u64 = rows.iter().map(|r| r.total_events).sum();
    assert_eq!(total as usize, accepted);
    // Every 15th magnitude is N/A and every 50th latitude is blank.
    assert!(accepted < 300 - 300 / 15);

    let export_path = config.pipeline.export_path.clone().unwrap();
    let exported = std::fs::read_to_string(&export_path).unwrap();
    let mut lines = exported.lines();
    assert_eq!(lines.next().unwrap(), ANALYTICS_COLUMNS.join(","));
    assert_eq!(lines.count(), rows.len());
}

#[tokio::test]
async fn rerunning_on_same_input_is_idempotent() {
    let dir = tempdir().unwrap();
    let config = synthetic_config(dir.path());
    let storage = open_sqlite(&config);
    let orch = Orchestrator::from_config(&config, storage.clone());
    let export_path = config.pipeline.export_path.clone().unwrap();

    assert_eq!(orch.run_once(Utc::now()).await.state, RunState::Succeeded);
    let first_rows = storage.read_analytics().await.unwrap();
    let first_export = std::fs::read(&export_path).unwrap();

    assert_eq!(orch.run_once(Utc::now()).await.state, RunState::Succeeded);
    let second_rows = storage.read_analytics().await.unwrap();
    let second_export = std::fs::read(&export_path).unwrap();

    assert_eq!(first_rows, second_rows);
    assert_eq!(first_export, second_export);
}

#[tokio::test]
async fn analytics_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let config = synthetic_config(dir.path());
    let rows = {
        let storage = open_sqlite(&config);
        let orch = Orchestrator::from_config(&config, storage.clone());
        assert_eq!(orch.run_once(Utc::now()).await.state, RunState::Succeeded);
        storage.read_analytics().await.unwrap()
    };

    let reopened = SqliteStorage::open(&config.pipeline.database).unwrap();
    assert_eq!(reopened.read_analytics().await.unwrap(), rows);
}

#[tokio::test]
async fn malformed_feed_fails_load_and_skips_transform() {
    let dir = tempdir().unwrap();
    let bad = "event_id,time,latitude,longitude,magnitude_raw,depth_km,tsunami_flag\n\
               E1,2025-11-01T04:00:00Z,10,-110,6.5,deep,0\n";
    let extractor = Arc::new(ScriptedExtractor::new(dir.path().join("raw.csv"), bad));
    let storage = Arc::new(InMemoryStorage::new());
    let orch = orchestrator(extractor, storage.clone(), 1, Duration::from_millis(5));

    let run = orch.run_once(Utc::now()).await;

    assert_eq!(run.state, RunState::Failed);
    assert!(run.stage(StageKind::Extract).is_succeeded());
    assert!(run.stage(StageKind::Load).is_failed());
    assert!(run.stage(StageKind::Transform).is_pending());
    assert!(storage.read_analytics().await.unwrap().is_empty());
}

#[tokio::test]
async fn quoted_multiline_fields_load_verbatim_into_sqlite() {
    let dir = tempdir().unwrap();
    let raw_path = dir.path().join("drop.csv");
    std::fs::write(
        &raw_path,
        "event_id,time,latitude,longitude,magnitude_raw,depth_km,tsunami_flag\n\
         E1,\"2025-11-01\n04:00\",10,-110,\"6.5\",10.0,1\n\
         E2,2025-11-01T05:00:00Z,\"3,5\",-110,5.0M,12.0,0\n",
    )
    .unwrap();

    let storage = Arc::new(SqliteStorage::open(dir.path().join("seismic.db")).unwrap());
    let loader = RawLoader::new(storage.clone(), WritePool::new("database_pool", 1));
    let report = loader.load(&raw_path).await.unwrap();
    assert_eq!(report.rows, 2);

    let raw = storage.read_raw_events().await.unwrap();
    assert_eq!(raw[0].time, "2025-11-01\n04:00");
    assert_eq!(raw[0].magnitude_raw, "6.5");
    assert_eq!(raw[1].latitude, "3,5");
    assert_eq!(raw[1].magnitude_raw, "5.0M");
}
