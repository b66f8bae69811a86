//! ICMP echo probing.
//!
//! One probe performs one echo round trip with a bounded wait. Platform
//! mechanics (raw socket, dgram ICMP, inert stub) are hidden behind the
//! [`EchoProbe`] trait; [`platform_probe`] is the single selection point.

pub mod error;
pub mod packet;
#[cfg(unix)]
pub mod raw;
pub mod stub;

pub use error::{ProbeError, Result};
#[cfg(unix)]
pub use raw::IcmpSocketProbe;
pub use stub::StubProbe;

use std::time::Duration;

/// Outcome of a single echo attempt. A timeout or a mismatched reply is an
/// ordinary unsuccessful result, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingResult {
    pub success: bool,
    pub rtt_ms: f64,
}

impl PingResult {
    /// The canonical unsuccessful result.
    pub const MISS: PingResult = PingResult {
        success: false,
        rtt_ms: 0.0,
    };
}

/// One ICMP echo round trip to a host, independent of OS specifics.
///
/// All implementations satisfy the same contract; beyond privilege or
/// availability errors at [`initialize`](EchoProbe::initialize) time,
/// callers observe no behavioral difference between variants.
pub trait EchoProbe: Send {
    /// Acquires the OS transport. Idempotent once successful. Fails with
    /// [`ProbeError::Permission`] when the required privilege is absent and
    /// [`ProbeError::Transport`] for other setup failures.
    fn initialize(&mut self) -> Result<()>;

    /// Releases the transport. Idempotent, safe without a prior initialize.
    fn shutdown(&mut self);

    /// Performs one echo exchange, waiting at most `timeout` for the reply.
    fn send(&mut self, host: &str, timeout: Duration) -> Result<PingResult>;
}

/// Selects the probe implementation for the current platform.
pub fn platform_probe() -> Box<dyn EchoProbe> {
    #[cfg(unix)]
    {
        Box::new(IcmpSocketProbe::new())
    }
    #[cfg(not(unix))]
    {
        Box::new(StubProbe::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub EchoProbe {}

        impl EchoProbe for EchoProbe {
            fn initialize(&mut self) -> Result<()>;
            fn shutdown(&mut self);
            fn send(&mut self, host: &str, timeout: Duration) -> Result<PingResult>;
        }
    }

    #[test]
    fn test_miss_is_unsuccessful_zero_rtt() {
        assert!(!PingResult::MISS.success);
        assert_eq!(PingResult::MISS.rtt_ms, 0.0);
    }

    #[test]
    fn test_platform_probe_shutdown_without_initialize() {
        // shutdown must be safe on a never-initialized probe.
        let mut probe = platform_probe();
        probe.shutdown();
        probe.shutdown();
    }
}

#[cfg(test)]
pub use tests::MockEchoProbe;
