//! Whole-file JSON export of statistics snapshots.

use crate::export::Result;
use crate::stats::StatisticsSnapshot;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
struct Report<'a> {
    timestamp: String,
    hosts: &'a [StatisticsSnapshot],
}

/// Writes the full report (every host, including histogram and recent
/// rtts), replacing any previous file contents.
pub fn write_snapshots(
    path: &Path,
    snapshots: &[StatisticsSnapshot],
    timestamp: DateTime<Local>,
) -> Result<()> {
    let report = Report {
        timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        hosts: snapshots,
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{StatsStore, DEFAULT_BOUNDARIES};

    #[test]
    fn test_report_roundtrips_through_serde() {
        let store = StatsStore::new();
        store.add_sample("host-a", 15.0, true);
        store.add_sample("host-a", 0.0, false);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        write_snapshots(&path, &store.snapshot_all(), Local::now()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert!(value["timestamp"].is_string());

        let hosts = value["hosts"].as_array().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0]["host"], "host-a");
        assert_eq!(hosts[0]["count"], 2);
        assert_eq!(hosts[0]["loss_ratio"], 0.5);
        assert_eq!(
            hosts[0]["histogram"].as_array().unwrap().len(),
            DEFAULT_BOUNDARIES.len() + 1
        );
        assert_eq!(hosts[0]["recent_rtts"][0], 15.0);
    }

    #[test]
    fn test_rewrites_replace_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        write_snapshots(&path, &[], Local::now()).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        write_snapshots(&path, &[], Local::now()).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(value["hosts"].as_array().unwrap().len(), 0);
        assert_eq!(first.len(), second.len());
    }
}
