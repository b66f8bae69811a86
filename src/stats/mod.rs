//! Rolling statistics aggregation and snapshots.

pub mod snapshot;
pub mod store;

pub use snapshot::StatisticsSnapshot;
pub use store::{StatsStore, DEFAULT_BOUNDARIES, MEDIAN_CAPACITY, RECENT_CAPACITY};
