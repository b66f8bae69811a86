use crate::stats::DEFAULT_BOUNDARIES;

/// Description of one monitored host.
///
/// Immutable after session creation except the interval, which is updated
/// live through [`PingSession::set_interval`](crate::session::PingSession).
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    pub host: String,
    /// Configured cadence in seconds, > 0.
    pub interval_s: f64,
    /// Ascending histogram bucket boundaries in milliseconds.
    pub boundaries: Vec<f64>,
}

impl TargetDescriptor {
    pub fn new(host: impl Into<String>, interval_s: f64) -> Self {
        Self {
            host: host.into(),
            interval_s,
            boundaries: DEFAULT_BOUNDARIES.to_vec(),
        }
    }
}
