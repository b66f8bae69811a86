//! Inert probe for platforms without ICMP support.

use crate::probe::error::Result;
use crate::probe::{EchoProbe, PingResult};
use std::time::Duration;

/// A probe with no transport: every attempt is an immediate unsuccessful
/// result and no operation ever errors. Used on unsupported platforms and
/// as the fallback when ICMP privilege is missing, where persistent 100%
/// loss in the statistics is the intended signal.
#[derive(Debug, Default)]
pub struct StubProbe;

impl EchoProbe for StubProbe {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {}

    fn send(&mut self, _host: &str, _timeout: Duration) -> Result<PingResult> {
        Ok(PingResult::MISS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_never_succeeds_never_errors() {
        let mut probe = StubProbe;
        probe.initialize().unwrap();
        let result = probe
            .send("anything", Duration::from_millis(10))
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.rtt_ms, 0.0);
        probe.shutdown();
        probe.shutdown();
    }

    #[test]
    fn test_stub_send_without_initialize() {
        let mut probe = StubProbe;
        assert!(probe.send("host", Duration::from_millis(1)).is_ok());
    }
}
