//! Thread-safe per-host rolling statistics, the only shared mutable state
//! in the core.

use crate::stats::snapshot::{build_snapshot, StatisticsSnapshot};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Capacity of the FIFO buffer feeding median computation.
pub const MEDIAN_CAPACITY: usize = 1024;

/// Capacity of the FIFO buffer of recent round-trip times.
pub const RECENT_CAPACITY: usize = 256;

/// Histogram bucket boundaries (ms) seeded into every new host record.
pub const DEFAULT_BOUNDARIES: [f64; 6] = [10.0, 20.0, 50.0, 100.0, 200.0, 500.0];

/// Mutable rolling statistics for one host. Owned exclusively by the store;
/// snapshots are built from copies.
#[derive(Debug, Clone)]
pub(crate) struct RollingStats {
    pub(crate) host: String,
    pub(crate) boundaries: Vec<f64>,
    /// Parallel to `boundaries` plus one overflow bucket.
    pub(crate) bucket_counts: Vec<u64>,
    pub(crate) sent_count: u64,
    pub(crate) success_count: u64,
    /// Running extremes over successful samples; sentinel infinities until
    /// the first success.
    pub(crate) min_ms: f64,
    pub(crate) max_ms: f64,
    pub(crate) sum_ms: f64,
    pub(crate) median_buffer: VecDeque<f64>,
    pub(crate) recent_rtts: VecDeque<f64>,
}

impl RollingStats {
    fn new(host: &str, boundaries: &[f64]) -> Self {
        Self {
            host: host.to_string(),
            boundaries: boundaries.to_vec(),
            bucket_counts: vec![0; boundaries.len() + 1],
            sent_count: 0,
            success_count: 0,
            min_ms: f64::INFINITY,
            max_ms: f64::NEG_INFINITY,
            sum_ms: 0.0,
            median_buffer: VecDeque::with_capacity(MEDIAN_CAPACITY),
            recent_rtts: VecDeque::with_capacity(RECENT_CAPACITY),
        }
    }

    fn record_success(&mut self, rtt: f64) {
        self.success_count += 1;
        self.sum_ms += rtt;
        self.min_ms = self.min_ms.min(rtt);
        self.max_ms = self.max_ms.max(rtt);

        if self.median_buffer.len() >= MEDIAN_CAPACITY {
            self.median_buffer.pop_front();
        }
        self.median_buffer.push_back(rtt);

        let bucket = self.bucket_index(rtt);
        self.bucket_counts[bucket] += 1;

        if self.recent_rtts.len() >= RECENT_CAPACITY {
            self.recent_rtts.pop_front();
        }
        self.recent_rtts.push_back(rtt);
    }

    /// First bucket whose boundary strictly exceeds the rtt; a sample equal
    /// to a boundary belongs to the next bucket, overflow if none match.
    fn bucket_index(&self, rtt: f64) -> usize {
        self.boundaries
            .iter()
            .position(|boundary| rtt < *boundary)
            .unwrap_or(self.boundaries.len())
    }

    /// Zeroes all counters and clears both buffers; the host identity and
    /// boundary configuration are preserved.
    fn clear(&mut self) {
        self.sent_count = 0;
        self.success_count = 0;
        self.min_ms = f64::INFINITY;
        self.max_ms = f64::NEG_INFINITY;
        self.sum_ms = 0.0;
        self.bucket_counts.iter_mut().for_each(|c| *c = 0);
        self.median_buffer.clear();
        self.recent_rtts.clear();
    }
}

/// Concurrency-safe mapping from host to rolling statistics.
///
/// A single mutex guards every mutation and the copy phase of reads;
/// derived values (mean, median, loss ratio) are computed from the copy
/// after the lock is released. The store never calls back into other
/// components while holding the lock and none of its operations fail.
#[derive(Debug, Default)]
pub struct StatsStore {
    hosts: Mutex<HashMap<String, RollingStats>>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a writer panicked mid-update; the counters
    // remain structurally valid, so the poison flag is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RollingStats>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records one probe attempt. Creates the host record on first contact,
    /// seeded with the default boundaries. Negative rtt values are clamped
    /// to zero; loss is implicit in the sent/success count delta.
    pub fn add_sample(&self, host: &str, rtt_ms: f64, success: bool) {
        let rtt = rtt_ms.max(0.0);
        let mut hosts = self.lock();
        let stats = hosts
            .entry(host.to_string())
            .or_insert_with(|| RollingStats::new(host, &DEFAULT_BOUNDARIES));
        stats.sent_count += 1;
        if success {
            stats.record_success(rtt);
        }
    }

    /// Point-in-time snapshot for one host; a zero-valued snapshot with an
    /// empty host id when the host is unknown.
    pub fn snapshot(&self, host: &str) -> StatisticsSnapshot {
        let copy = self.lock().get(host).cloned();
        match copy {
            Some(stats) => build_snapshot(&stats),
            None => StatisticsSnapshot::default(),
        }
    }

    /// Snapshots for every known host, in no guaranteed order.
    pub fn snapshot_all(&self) -> Vec<StatisticsSnapshot> {
        let copies: Vec<RollingStats> = self.lock().values().cloned().collect();
        copies.iter().map(build_snapshot).collect()
    }

    /// Zeroes one host's statistics, preserving its record and boundaries.
    pub fn reset(&self, host: &str) {
        if let Some(stats) = self.lock().get_mut(host) {
            stats.clear();
        }
    }

    /// Zeroes every host's statistics.
    pub fn reset_all(&self) {
        for stats in self.lock().values_mut() {
            stats.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_host_snapshot_is_zero_valued() {
        let store = StatsStore::new();
        let snap = store.snapshot("unknown");
        assert!(snap.host.is_empty());
        assert_eq!(snap.count, 0);
        assert_eq!(snap.loss_ratio, 0.0);
        assert_eq!(snap.min_ms, 0.0);
        assert_eq!(snap.max_ms, 0.0);
        assert_eq!(snap.mean_ms, 0.0);
        assert_eq!(snap.median_ms, 0.0);
    }

    #[test]
    fn test_basic_success_and_loss() {
        let store = StatsStore::new();
        store.add_sample("host", 10.0, true);
        store.add_sample("host", 20.0, true);
        store.add_sample("host", 0.0, false);

        let snap = store.snapshot("host");
        assert_eq!(snap.host, "host");
        assert_eq!(snap.count, 3);
        assert_eq!(snap.loss_ratio, 1.0 / 3.0);
        assert_eq!(snap.min_ms, 10.0);
        assert_eq!(snap.max_ms, 20.0);
        assert_eq!(snap.mean_ms, 15.0);
        assert_eq!(snap.median_ms, 15.0);
        assert!(!snap.histogram.is_empty());
        assert_eq!(snap.recent_rtts, vec![10.0, 20.0]);
    }

    #[test]
    fn test_failures_never_touch_success_stats() {
        let store = StatsStore::new();
        for _ in 0..50 {
            store.add_sample("host", 999.0, false);
        }
        let snap = store.snapshot("host");
        assert_eq!(snap.count, 50);
        assert_eq!(snap.loss_ratio, 1.0);
        assert_eq!(snap.mean_ms, 0.0);
        assert_eq!(snap.median_ms, 0.0);
        assert!(snap.recent_rtts.is_empty());
        assert_eq!(snap.histogram.iter().map(|(_, c)| c).sum::<u64>(), 0);
    }

    #[test]
    fn test_histogram_bucket_edges() {
        // Boundary-equal samples fall into the next bucket (strict
        // less-than), and values past the last boundary overflow.
        let store = StatsStore::new();
        for rtt in [5.0, 10.0, 55.0, 500.0, 800.0] {
            store.add_sample("h", rtt, true);
        }

        let snap = store.snapshot("h");
        let counts: Vec<u64> = snap.histogram.iter().map(|&(_, c)| c).collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 0, 0, 2]);
        assert_eq!(snap.histogram.len(), DEFAULT_BOUNDARIES.len() + 1);
        assert_eq!(snap.histogram[0].0, 10.0);
        // Overflow bucket reuses the last boundary as its label.
        assert_eq!(snap.histogram[6].0, 500.0);
    }

    #[test]
    fn test_negative_rtt_clamped_to_zero() {
        let store = StatsStore::new();
        store.add_sample("h", -5.0, true);
        let snap = store.snapshot("h");
        assert_eq!(snap.min_ms, 0.0);
        assert_eq!(snap.max_ms, 0.0);
        assert_eq!(snap.recent_rtts, vec![0.0]);
    }

    #[test]
    fn test_buffers_are_bounded() {
        let store = StatsStore::new();
        for i in 0..(MEDIAN_CAPACITY + 500) {
            store.add_sample("h", i as f64, true);
        }
        assert_eq!(
            store.lock().get("h").unwrap().median_buffer.len(),
            MEDIAN_CAPACITY
        );
        let snap = store.snapshot("h");
        assert_eq!(snap.recent_rtts.len(), RECENT_CAPACITY);
        // Oldest entries were evicted: the recent window holds the tail.
        assert_eq!(
            snap.recent_rtts[0],
            (MEDIAN_CAPACITY + 500 - RECENT_CAPACITY) as f64
        );
        // Median is computed over the bounded buffer, so it reflects the
        // last MEDIAN_CAPACITY samples only.
        let first_kept = 500.0;
        assert!(snap.median_ms >= first_kept);
    }

    #[test]
    fn test_reset_preserves_host_and_boundaries() {
        let store = StatsStore::new();
        store.add_sample("r", 30.0, true);
        store.add_sample("r", 40.0, true);
        store.reset("r");

        let snap = store.snapshot("r");
        assert_eq!(snap.host, "r");
        assert_eq!(snap.count, 0);
        assert_eq!(snap.mean_ms, 0.0);
        assert_eq!(snap.histogram.len(), DEFAULT_BOUNDARIES.len() + 1);
        assert_eq!(snap.histogram.iter().map(|(_, c)| c).sum::<u64>(), 0);
        assert!(snap.recent_rtts.is_empty());
    }

    #[test]
    fn test_reset_unknown_host_is_noop() {
        let store = StatsStore::new();
        store.reset("missing");
        assert!(store.snapshot_all().is_empty());
    }

    #[test]
    fn test_reset_all() {
        let store = StatsStore::new();
        store.add_sample("a", 1.0, true);
        store.add_sample("b", 2.0, true);
        store.reset_all();

        let snaps = store.snapshot_all();
        assert_eq!(snaps.len(), 2);
        assert!(snaps.iter().all(|s| s.count == 0));
    }

    #[test]
    fn test_snapshot_all_covers_every_host() {
        let store = StatsStore::new();
        store.add_sample("a", 1.0, true);
        store.add_sample("b", 2.0, false);
        store.add_sample("c", 3.0, true);

        let mut hosts: Vec<String> =
            store.snapshot_all().into_iter().map(|s| s.host).collect();
        hosts.sort();
        assert_eq!(hosts, vec!["a", "b", "c"]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_rolling_invariants_hold(
            samples in prop::collection::vec((-10.0f64..2000.0, any::<bool>()), 0..600)
        ) {
            let store = StatsStore::new();
            let mut expected_sent = 0u64;
            let mut expected_success = 0u64;
            for &(rtt, success) in &samples {
                store.add_sample("h", rtt, success);
                expected_sent += 1;
                if success {
                    expected_success += 1;
                }
            }

            let snap = store.snapshot("h");
            if expected_sent == 0 {
                prop_assert_eq!(snap.count, 0);
                prop_assert_eq!(snap.loss_ratio, 0.0);
            } else {
                prop_assert_eq!(snap.count, expected_sent);
                let expected_loss =
                    (expected_sent - expected_success) as f64 / expected_sent as f64;
                prop_assert_eq!(snap.loss_ratio, expected_loss);
            }
            prop_assert!(snap.loss_ratio >= 0.0 && snap.loss_ratio <= 1.0);
            prop_assert_eq!(
                snap.histogram.iter().map(|(_, c)| c).sum::<u64>(),
                expected_success
            );
            prop_assert!(snap.recent_rtts.len() <= RECENT_CAPACITY);
            prop_assert!(snap.min_ms.is_finite());
            prop_assert!(snap.max_ms.is_finite());
            prop_assert!(snap.mean_ms.is_finite());
            prop_assert!(snap.median_ms.is_finite());
        }
    }
}
