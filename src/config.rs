//! CLI configuration.
//!
//! Argument parsing and validation for the pingmon binary.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

/// Export format for aggregated statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    None,
    Csv,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "pingmon")]
#[command(about = "Continuous ICMP reachability and latency monitor")]
#[command(version)]
pub struct Config {
    /// Hosts to monitor
    #[arg(required = true)]
    pub hosts: Vec<String>,

    /// Ping interval per host in seconds
    #[arg(short, long, default_value_t = 1.0)]
    pub interval: f64,

    /// Export format for aggregated statistics
    #[arg(long, value_enum, default_value = "none")]
    pub output_format: OutputFormat,

    /// Path to export aggregated statistics
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Export period in seconds
    #[arg(long, default_value_t = 5)]
    pub export_period: u64,

    /// Console refresh period in milliseconds
    #[arg(long, default_value_t = 500)]
    pub render_period_ms: u64,

    /// Disable the terminal UI (useful for non-interactive environments)
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), String> {
        debug!("Validating configuration");

        if self.hosts.is_empty() {
            return Err("at least one host is required".into());
        }
        if self.interval <= 0.0 {
            return Err("interval must be > 0".into());
        }
        if self.export_period == 0 {
            return Err("export_period must be > 0".into());
        }
        if self.render_period_ms == 0 {
            return Err("render_period_ms must be > 0".into());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            ));
        }

        debug!("Configuration validated successfully");
        Ok(())
    }

    /// Effective export format: `--output-file` without an explicit format
    /// implies CSV.
    pub fn effective_format(&self) -> OutputFormat {
        if self.output_format == OutputFormat::None && self.output_file.is_some() {
            OutputFormat::Csv
        } else {
            self.output_format
        }
    }

    /// Export target path, with a default next to the working directory.
    pub fn output_path(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("pingmon.csv"))
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }
}
