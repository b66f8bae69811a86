//! Per-target scheduling.

pub mod scheduler;
pub mod target;

pub use scheduler::{PingSession, MIN_INTERVAL_S};
pub use target::TargetDescriptor;
