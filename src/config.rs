use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;
use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "seismic.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineSettings,
    pub extract: ExtractSettings,
    pub orchestrator: OrchestratorSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub dag_id: String,
    pub tags: Vec<String>,
    pub database: PathBuf,
    pub raw_path: PathBuf,
    pub export_path: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dag_id: constants::DEFAULT_DAG_ID.to_string(),
            tags: vec![
                "elt".to_string(),
                "geospatial".to_string(),
                "disaster_risk".to_string(),
            ],
            database: PathBuf::from("data/seismic_events.db"),
            raw_path: PathBuf::from("data/raw/seismic_raw_events.csv"),
            export_path: Some(PathBuf::from("data/analytics/seismic_analytics.csv")),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Generate a synthetic feed at `raw_path`.
    Synthetic,
    /// Expect an external drop at `raw_path`.
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub mode: ExtractMode,
    pub rows: usize,
    pub seed: Option<u64>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Synthetic,
            rows: 5000,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    pub schedule_interval_secs: u64,
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub load_concurrency: u32,
    pub priority_weight: i32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            schedule_interval_secs: constants::DEFAULT_SCHEDULE_INTERVAL_SECS,
            retries: constants::DEFAULT_RETRIES,
            retry_delay_secs: constants::DEFAULT_RETRY_DELAY_SECS,
            load_concurrency: constants::DEFAULT_LOAD_CONCURRENCY,
            priority_weight: constants::DEFAULT_PRIORITY_WEIGHT,
        }
    }
}

impl OrchestratorSettings {
    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub listen_addr: Option<SocketAddr>,
}

impl Config {
    /// Load from `path`. A missing file means defaults; a present but invalid
    /// file is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(db) = std::env::var("SEISMIC_DB_PATH") {
            self.pipeline.database = PathBuf::from(db);
        }
        if let Ok(raw) = std::env::var("SEISMIC_RAW_PATH") {
            self.pipeline.raw_path = PathBuf::from(raw);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.dag_id.trim().is_empty() {
            return Err(PipelineError::Config("pipeline.dag_id must not be empty".to_string()));
        }
        if self.orchestrator.load_concurrency == 0 {
            return Err(PipelineError::Config(
                "orchestrator.load_concurrency must be at least 1".to_string(),
            ));
        }
        if self.orchestrator.schedule_interval_secs == 0 {
            return Err(PipelineError::Config(
                "orchestrator.schedule_interval_secs must be positive".to_string(),
            ));
        }
        if self.extract.mode == ExtractMode::Synthetic && self.extract.rows == 0 {
            return Err(PipelineError::Config(
                "extract.rows must be positive in synthetic mode".to_string(),
            ));
        }
        Ok(())
    }
}
