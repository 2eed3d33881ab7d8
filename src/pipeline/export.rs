use std::path::Path;
use tracing::info;

use crate::constants::ANALYTICS_COLUMNS;
use crate::error::Result;
use crate::pipeline::ingestion::csv::join_line;
use crate::types::AggregateRow;

pub fn render_analytics_csv(rows: &[AggregateRow]) -> String {
    let mut out = join_line(&ANALYTICS_COLUMNS);
    out.push('\n');
    for row in rows {
        let fields = [
            row.event_day
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            row.location_zone.to_string(),
            row.risk_level.to_string(),
            row.total_events.to_string(),
            row.avg_magnitude.to_string(),
            row.tsunami_alerts_count.to_string(),
        ];
        out.push_str(&join_line(&fields));
        out.push('\n');
    }
    out
}

/// Writes the analytics table as CSV for dashboards.
///
/// The file is written next to its destination and renamed into place, so a
/// reader never sees a half-written export.
pub async fn write_analytics_csv(rows: &[AggregateRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let tmp = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp, render_analytics_csv(rows)).await?;
    tokio::fs::rename(&tmp, path).await?;
    info!("export: wrote {} analytics rows to {}", rows.len(), path.display());
    Ok(())
}
