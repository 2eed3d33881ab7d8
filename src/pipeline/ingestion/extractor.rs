use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::csv::join_line;
use super::loader::split_header;
use crate::constants::RAW_COLUMNS;
use crate::error::{PipelineError, Result};

/// Handle to a raw tabular resource produced by an extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResource {
    pub location: PathBuf,
    pub rows: usize,
}

/// Source of raw event data for the load stage.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self) -> Result<RawResource>;
}

/// Hands an existing CSV drop to the loader.
pub struct CsvFileExtractor {
    path: PathBuf,
}

impl CsvFileExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Extractor for CsvFileExtractor {
    fn name(&self) -> &str {
        "csv_file"
    }

    async fn extract(&self) -> Result<RawResource> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PipelineError::Extract(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        if contents.trim().is_empty() {
            return Err(PipelineError::Extract(format!("{} is empty", self.path.display())));
        }
        let (_, records) = split_header(&contents)?;

        let rows = records.len();
        info!("extract: found {} raw rows in {}", rows, self.path.display());
        Ok(RawResource {
            location: self.path.clone(),
            rows,
        })
    }
}

/// Generates a noisy feed with the same defects the live feed shows:
/// unit-suffixed and `N/A` magnitudes, and blank latitudes.
pub struct SyntheticExtractor {
    path: PathBuf,
    rows: usize,
    seed: Option<u64>,
}

impl SyntheticExtractor {
    pub fn new(path: impl Into<PathBuf>, rows: usize, seed: Option<u64>) -> Self {
        Self {
            path: path.into(),
            rows,
            seed,
        }
    }

    /// Renders the feed as CSV text, header included.
    pub fn render(&self) -> Result<String> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let latitude = Uniform::new(-40.0, 40.0);
        let longitude = Uniform::new(-120.0, 120.0);
        let depth = Uniform::new(1.0, 700.0);
        let magnitude = Normal::new(4.5, 1.5)
            .map_err(|e| PipelineError::Extract(format!("magnitude distribution: {e}")))?;

        let start = NaiveDate::from_ymd_opt(2025, 11, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| PipelineError::Extract("invalid synthetic start time".to_string()))?;

        let mut out = join_line(&RAW_COLUMNS);
        out.push('\n');

        for i in 0..self.rows {
            let time = start + Duration::hours((i % (24 * 30)) as i64);

            let mag: f64 = magnitude.sample(&mut rng);
            let magnitude_raw = if i % 15 == 0 {
                "N/A".to_string()
            } else if rng.gen::<f64>() < 0.1 {
                format!("{:.1}M", mag)
            } else {
                format!("{:.1}", mag)
            };

            let lat: f64 = latitude.sample(&mut rng);
            let latitude_raw = if i % 50 == 0 {
                String::new()
            } else {
                lat.to_string()
            };
            let lon: f64 = longitude.sample(&mut rng);
            let depth_km = (depth.sample(&mut rng) * 100.0_f64).round() / 100.0;
            let tsunami_flag = u8::from(rng.gen::<f64>() < 0.1);

            let fields = [
                format!("EVT{:05}", i),
                format!("{}Z", time.format("%Y-%m-%dT%H:%M:%S")),
                latitude_raw,
                lon.to_string(),
                magnitude_raw,
                depth_km.to_string(),
                tsunami_flag.to_string(),
            ];
            out.push_str(&join_line(&fields));
            out.push('\n');
        }
        Ok(out)
    }
}

async fn write_resource(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

#[async_trait]
impl Extractor for SyntheticExtractor {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn extract(&self) -> Result<RawResource> {
        let contents = self.render()?;
        write_resource(&self.path, &contents).await?;
        crate::metrics::ingestion::extracted(self.rows);
        info!(
            "extract: wrote {} synthetic raw rows to {}",
            self.rows,
            self.path.display()
        );
        Ok(RawResource {
            location: self.path.clone(),
            rows: self.rows,
        })
    }
}
