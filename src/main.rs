use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use seismic_elt::config::{Config, DEFAULT_CONFIG_PATH};
use seismic_elt::logging;
use seismic_elt::pipeline::export::write_analytics_csv;
use seismic_elt::pipeline::ingestion::{Extractor, RawLoader, WritePool};
use seismic_elt::pipeline::orchestrator::{extractor_for, RunState, LOAD_POOL_NAME};
use seismic_elt::pipeline::processing::TransformStage;
use seismic_elt::pipeline::{Orchestrator, Scheduler, SqliteStorage, Storage};

#[derive(Parser)]
#[command(name = "seismic_elt")]
#[command(about = "Seismic event ELT pipeline: raw feed to regional risk analytics")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config (falls back to SEISMIC_CONFIG, then seismic.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract, load and transform once
    Run {
        /// Print the finished run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline on its schedule until interrupted
    Schedule {
        /// Stop after this many runs
        #[arg(long)]
        max_runs: Option<u32>,
    },
    /// Produce the raw resource only
    Extract,
    /// Replace the raw table from a CSV file
    Load {
        /// Raw CSV to load (defaults to the configured raw path)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Rebuild the analytics table from the raw table
    Transform,
    /// Write the analytics table out as CSV
    Export {
        /// Destination (defaults to the configured export path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let storage = SqliteStorage::open(&config.pipeline.database).with_context(|| {
        format!(
            "failed to open database {}",
            config.pipeline.database.display()
        )
    })?;
    Ok(Arc::new(storage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var("SEISMIC_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    let _log_guard = logging::init_logging(&config.pipeline.log_dir)?;
    if let Some(addr) = config.metrics.listen_addr {
        seismic_elt::metrics::init_metrics(addr);
    }
    info!(
        dag_id = %config.pipeline.dag_id,
        tags = ?config.pipeline.tags,
        "Loaded config from {}", config_path.display()
    );

    match cli.command {
        Commands::Run { json } => {
            let orchestrator = Orchestrator::from_config(&config, open_storage(&config)?);
            let run = orchestrator.run_once(Utc::now()).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                println!("Run {} finished: {}", run.run_id, run.state.as_str());
                for record in &run.stages {
                    println!("   {}: {:?}", record.stage, record.state);
                }
            }
            if run.state != RunState::Succeeded {
                anyhow::bail!("run {} ended {}", run.run_id, run.state.as_str());
            }
        }
        Commands::Schedule { max_runs } => {
            let orchestrator = Orchestrator::from_config(&config, open_storage(&config)?);
            let cancel = orchestrator.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping scheduler");
                    cancel.cancel();
                }
            });

            let scheduler =
                Scheduler::new(orchestrator, config.orchestrator.schedule_interval());
            let summary = scheduler.run(max_runs).await;
            println!(
                "Scheduler stopped: {} runs ({} succeeded, {} failed, {} cancelled)",
                summary.runs, summary.succeeded, summary.failed, summary.cancelled
            );
        }
        Commands::Extract => {
            let extractor = extractor_for(&config);
            let resource = extractor.extract().await?;
            println!(
                "Extracted {} rows to {}",
                resource.rows,
                resource.location.display()
            );
        }
        Commands::Load { input } => {
            let input = input.unwrap_or_else(|| config.pipeline.raw_path.clone());
            let pool = WritePool::new(LOAD_POOL_NAME, config.orchestrator.load_concurrency);
            let loader = RawLoader::new(open_storage(&config)?, pool);
            let report = loader.load(&input).await?;
            println!("Loaded {} rows into {}", report.rows, report.table);
        }
        Commands::Transform => {
            let stage = TransformStage::new(open_storage(&config)?);
            match stage.run().await {
                Ok(report) => println!(
                    "Transformed {} raw rows: {} accepted, {} rejected, {} groups",
                    report.raw_rows, report.accepted, report.rejected, report.groups
                ),
                Err(e) => {
                    error!("Transform failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Export { output } => {
            let output = output
                .or_else(|| config.pipeline.export_path.clone())
                .context("no export path given and none configured")?;
            let rows = open_storage(&config)?.read_analytics().await?;
            write_analytics_csv(&rows, &output).await?;
            println!("Exported {} rows to {}", rows.len(), output.display());
        }
    }
    Ok(())
}
