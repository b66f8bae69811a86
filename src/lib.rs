//! Pingmon - continuous ICMP reachability and latency monitor
//!
//! This library continuously measures reachability and round-trip time to a
//! set of hosts using ICMP echo, and maintains rolling per-host statistics
//! (loss ratio, min/max/mean/median, a bounded histogram, a bounded
//! recent-sample window) that can be read concurrently by presentation and
//! export consumers.

pub mod config;
pub mod export;
pub mod logging;
pub mod probe;
pub mod session;
pub mod stats;
pub mod view;
