//! Consumer-facing statistics values, derived from a copied rolling record
//! outside the store's lock.

use crate::stats::store::RollingStats;
use serde::Serialize;

/// Immutable point-in-time view of one host's rolling statistics.
///
/// Produced on demand and never shared with or mutated by the store after
/// creation. All numeric fields are finite: min/max/mean/median are 0 when
/// no successful sample exists and the loss ratio is 0 before any sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub host: String,
    pub count: u64,
    pub loss_ratio: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    /// (upper boundary, count) pairs, one per bucket; the final overflow
    /// entry reuses the last boundary as its label.
    pub histogram: Vec<(f64, u64)>,
    /// Most recent successful round-trip times, oldest first.
    pub recent_rtts: Vec<f64>,
}

/// Derives a snapshot from a copied record. Pure transformation, no locks.
pub(crate) fn build_snapshot(stats: &RollingStats) -> StatisticsSnapshot {
    let loss_ratio = if stats.sent_count == 0 {
        0.0
    } else {
        (stats.sent_count - stats.success_count) as f64 / stats.sent_count as f64
    };

    // The internal +inf/-inf running extremes never escape into a snapshot.
    let (min_ms, max_ms, mean_ms, median_ms) = if stats.success_count == 0 {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        (
            stats.min_ms,
            stats.max_ms,
            stats.sum_ms / stats.success_count as f64,
            median(stats.median_buffer.iter().copied().collect()),
        )
    };

    let histogram = stats
        .bucket_counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let boundary = match stats.boundaries.get(i).or_else(|| stats.boundaries.last()) {
                Some(&b) => b,
                None => 0.0,
            };
            (boundary, count)
        })
        .collect();

    StatisticsSnapshot {
        host: stats.host.clone(),
        count: stats.sent_count,
        loss_ratio,
        min_ms,
        max_ms,
        mean_ms,
        median_ms,
        histogram,
        recent_rtts: stats.recent_rtts.iter().copied().collect(),
    }
}

/// Median of an unordered sample buffer via selection (expected O(n)),
/// never a full sort. Returns 0 for an empty buffer.
pub(crate) fn median(mut samples: Vec<f64>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len();
    if n % 2 == 1 {
        select_nth(&mut samples, n / 2)
    } else {
        let upper = select_nth(&mut samples, n / 2);
        let lower = select_nth(&mut samples, n / 2 - 1);
        (lower + upper) / 2.0
    }
}

fn select_nth(samples: &mut [f64], index: usize) -> f64 {
    let (_, nth, _) = samples.select_nth_unstable_by(index, |a, b| a.total_cmp(b));
    *nth
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_median_matches_sorted_reference(
            samples in prop::collection::vec(0.0f64..10_000.0, 1..200)
        ) {
            let mut sorted = samples.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let n = sorted.len();
            let expected = if n % 2 == 1 {
                sorted[n / 2]
            } else {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            };
            prop_assert_eq!(median(samples), expected);
        }
    }
}
