//! Append-mode CSV export of statistics snapshots.

use crate::export::Result;
use crate::stats::StatisticsSnapshot;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

const CSV_HEADER: &str = "timestamp,host,count,loss_ratio,min_ms,max_ms,mean_ms,median_ms";

/// Appends one row per snapshot, writing the header only when the file did
/// not exist before this call. No-op for an empty snapshot list.
pub fn append_snapshots(
    path: &Path,
    snapshots: &[StatisticsSnapshot],
    timestamp: DateTime<Local>,
) -> Result<()> {
    if snapshots.is_empty() {
        return Ok(());
    }

    let new_file = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if new_file {
        writeln!(file, "{}", CSV_HEADER)?;
    }

    let ts = timestamp.format("%Y-%m-%d %H:%M:%S");
    for snap in snapshots {
        writeln!(
            file,
            "\"{}\",\"{}\",{},{},{},{},{},{}",
            ts,
            snap.host,
            snap.count,
            snap.loss_ratio,
            snap.min_ms,
            snap.max_ms,
            snap.mean_ms,
            snap.median_ms
        )?;
    }
    Ok(())
}
