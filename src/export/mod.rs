//! Snapshot export collaborators (CSV and JSON).
//!
//! Exporters only consume [`StatisticsSnapshot`](crate::stats::StatisticsSnapshot)
//! values; they never touch the store's internals.

pub mod csv;
pub mod json;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
