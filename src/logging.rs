use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{PipelineError, Result};

const LOG_FILE_PREFIX: &str = "seismic_elt.log";
const DEFAULT_FILTER: &str = "seismic_elt=info,info";

/// Console plus daily-rolling JSON file logging.
///
/// Console output goes to stderr so stdout stays free for `run --json`
/// reports. Keep the returned guard alive for the life of the process or
/// buffered file lines are lost on exit.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_current_span(true).with_writer(file_writer))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| PipelineError::Config(format!("logging already initialised: {e}")))?;

    Ok(guard)
}
