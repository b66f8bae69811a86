//! ICMP socket probe for unix-like platforms.

use crate::probe::error::{ProbeError, Result};
use crate::probe::packet::{self, EchoRequest, PACKET_SIZE};
use crate::probe::{EchoProbe, PingResult};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::ErrorKind;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::process;
use std::time::{Duration, Instant};
use tracing::debug;

// Large enough for an IP header plus any echo reply we would accept.
const RECV_BUF_SIZE: usize = 512;

/// ICMP echo probe backed by an OS socket.
///
/// Linux and most unix systems require CAP_NET_RAW (or root) for `SOCK_RAW`;
/// macOS serves ICMP through unprivileged `SOCK_DGRAM` sockets, which is
/// what its ping(8) uses, so that type is selected there.
pub struct IcmpSocketProbe {
    socket: Option<Socket>,
    identifier: u16,
    sequence: u16,
}

impl IcmpSocketProbe {
    pub fn new() -> Self {
        Self {
            socket: None,
            // Probe-scoped identifier, embedded in every request and matched
            // against replies to filter unrelated ICMP traffic.
            identifier: (process::id() & 0xFFFF) as u16,
            sequence: 0,
        }
    }

    fn socket_type() -> Type {
        if cfg!(target_os = "macos") {
            Type::DGRAM
        } else {
            Type::RAW
        }
    }

    /// Resolves `host` to an IPv4 destination, trying the literal form
    /// before name resolution.
    fn resolve(host: &str) -> Result<SocketAddrV4> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Ok(SocketAddrV4::new(addr, 0));
        }
        let candidates = (host, 0u16)
            .to_socket_addrs()
            .map_err(|e| ProbeError::Resolution(format!("{}: {}", host, e)))?;
        for candidate in candidates {
            if let SocketAddr::V4(v4) = candidate {
                return Ok(v4);
            }
        }
        Err(ProbeError::Resolution(format!(
            "{}: no IPv4 address",
            host
        )))
    }
}

impl Default for IcmpSocketProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoProbe for IcmpSocketProbe {
    fn initialize(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Ok(());
        }
        let socket = Socket::new(Domain::IPV4, Self::socket_type(), Some(Protocol::ICMPV4))
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => ProbeError::Permission(
                    "ICMP socket requires CAP_NET_RAW or root".to_string(),
                ),
                _ => ProbeError::Transport(e),
            })?;
        self.sequence = 0;
        self.socket = Some(socket);
        debug!(identifier = self.identifier, "ICMP socket acquired");
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.socket.take().is_some() {
            debug!("ICMP socket released");
        }
    }

    fn send(&mut self, host: &str, timeout: Duration) -> Result<PingResult> {
        let socket = self.socket.as_ref().ok_or_else(|| {
            ProbeError::Transport(std::io::Error::new(
                ErrorKind::NotConnected,
                "probe not initialized",
            ))
        })?;

        let dest = Self::resolve(host)?;
        self.sequence = self.sequence.wrapping_add(1);
        let request = EchoRequest {
            identifier: self.identifier,
            sequence: self.sequence,
        };
        let datagram = request.encode();

        // The read timeout is the bounded readiness wait for the reply.
        socket.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

        let sent_at = Instant::now();
        let sent = socket.send_to(&datagram, &SockAddr::from(SocketAddr::V4(dest)))?;
        if sent != PACKET_SIZE {
            return Err(ProbeError::Transport(std::io::Error::new(
                ErrorKind::WriteZero,
                "short ICMP send",
            )));
        }

        let mut buf = [MaybeUninit::<u8>::uninit(); RECV_BUF_SIZE];
        let received = match socket.recv_from(&mut buf) {
            Ok((len, _)) => len,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                debug!(host, timeout_ms = timeout.as_millis() as u64, "echo reply timed out");
                return Ok(PingResult::MISS);
            }
            Err(e) => return Err(ProbeError::Transport(e)),
        };
        let rtt_ms = sent_at.elapsed().as_secs_f64() * 1000.0;

        // recv_from initialized the first `received` bytes of `buf`.
        let reply_bytes =
            unsafe { &*(&buf[..received] as *const [MaybeUninit<u8>] as *const [u8]) };
        match packet::parse_reply(reply_bytes, self.identifier) {
            Some(reply) => {
                debug!(host, sequence = reply.sequence, rtt_ms, "echo reply received");
                Ok(PingResult {
                    success: true,
                    rtt_ms,
                })
            }
            None => {
                debug!(host, "discarding unrelated or malformed ICMP datagram");
                Ok(PingResult::MISS)
            }
        }
    }
}

impl Drop for IcmpSocketProbe {
    fn drop(&mut self) {
        self.shutdown();
    }
}
