use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::pipeline::export::write_analytics_csv;
use crate::pipeline::ingestion::{Extractor, LoadReport, RawLoader, RawResource};
use crate::pipeline::orchestrator::{DagRun, StageKind};
use crate::pipeline::processing::{TransformReport, TransformStage};
use crate::pipeline::storage::Storage;

/// What a stage hands to its downstream stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageOutput {
    Extracted(RawResource),
    Loaded(LoadReport),
    Transformed(TransformReport),
}

/// The callables behind the three stages of one pipeline.
pub struct SeismicTasks {
    extractor: Arc<dyn Extractor>,
    loader: RawLoader,
    transform: TransformStage,
    storage: Arc<dyn Storage>,
    export_path: Option<PathBuf>,
}

impl SeismicTasks {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        loader: RawLoader,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            extractor,
            loader,
            transform: TransformStage::new(storage.clone()),
            storage,
            export_path: None,
        }
    }

    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub async fn execute(&self, stage: StageKind, run: &DagRun) -> Result<StageOutput> {
        match stage {
            StageKind::Extract => {
                debug!(extractor = self.extractor.name(), "extract: starting");
                Ok(StageOutput::Extracted(self.extractor.extract().await?))
            }
            StageKind::Load => {
                let location = match run.output(StageKind::Extract) {
                    Some(StageOutput::Extracted(resource)) => resource.location.clone(),
                    _ => return Err(PipelineError::MissingUpstream(StageKind::Load.as_str())),
                };
                Ok(StageOutput::Loaded(self.loader.load(&location).await?))
            }
            StageKind::Transform => {
                let report = self.transform.run().await?;
                self.export().await;
                Ok(StageOutput::Transformed(report))
            }
        }
    }

    /// Best-effort CSV export of the freshly swapped analytics table.
    async fn export(&self) {
        let Some(path) = &self.export_path else {
            return;
        };
        let result = match self.storage.read_analytics().await {
            Ok(rows) => write_analytics_csv(&rows, path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("export: could not write {}: {}", path.display(), e);
        }
    }
}
