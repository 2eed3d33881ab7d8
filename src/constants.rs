//! Table and column names shared by the loader, the transform and the exporter.

pub const DEFAULT_DAG_ID: &str = "elt_seismic_risk_pipeline";

pub const RAW_TABLE: &str = "raw_data_seismic_events";
pub const ANALYTICS_TABLE: &str = "analytics_seismic_risk";

/// Raw resource header, in column order.
pub const RAW_COLUMNS: [&str; 7] = [
    "event_id",
    "time",
    "latitude",
    "longitude",
    "magnitude_raw",
    "depth_km",
    "tsunami_flag",
];

pub const ANALYTICS_COLUMNS: [&str; 6] = [
    "event_day",
    "location_zone",
    "risk_level",
    "total_events",
    "avg_magnitude",
    "tsunami_alerts_count",
];

// Classification thresholds
pub const HIGH_RISK_MIN_MAGNITUDE: f64 = 6.0;
pub const MEDIUM_RISK_MIN_MAGNITUDE: f64 = 4.0;
pub const PACIFIC_LATITUDE_SPLIT: f64 = 30.0;
pub const PACIFIC_MAX_LONGITUDE: f64 = -100.0;

/// Unit marker some feeds append to magnitudes (e.g. "5.2M").
pub const MAGNITUDE_UNIT_SUFFIX: char = 'M';

// Orchestrator defaults
pub const DEFAULT_SCHEDULE_INTERVAL_SECS: u64 = 6 * 60 * 60;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5 * 60;
pub const DEFAULT_LOAD_CONCURRENCY: u32 = 1;
pub const DEFAULT_PRIORITY_WEIGHT: i32 = 100;
