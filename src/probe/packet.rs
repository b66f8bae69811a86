//! ICMP echo wire format: request encoding, reply validation, and the
//! Internet checksum.

/// ICMP message type for an echo request.
pub const ICMP_ECHO_REQUEST: u8 = 8;

/// ICMP message type for an echo reply.
pub const ICMP_ECHO_REPLY: u8 = 0;

/// ICMP header size in bytes (type, code, checksum, identifier, sequence).
pub const HEADER_SIZE: usize = 8;

/// Payload size in bytes, classic ping(8) filler length.
pub const PAYLOAD_SIZE: usize = 56;

/// Total echo request size in bytes.
pub const PACKET_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE;

const PAYLOAD_FILL: u8 = 0x42;

/// An echo request to be sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoRequest {
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoRequest {
    /// Encodes the request with its checksum filled in. The checksum field
    /// is zero while the sum is computed, then written back big-endian.
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = ICMP_ECHO_REQUEST;
        buf[1] = 0;
        buf[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        buf[HEADER_SIZE..].fill(PAYLOAD_FILL);
        let sum = checksum(&buf);
        buf[2..4].copy_from_slice(&sum.to_be_bytes());
        buf
    }
}

/// A validated echo reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub identifier: u16,
    pub sequence: u16,
}

/// Internet checksum (RFC 1071): one's-complement sum of all 16-bit words,
/// folded into 16 bits and complemented. An odd trailing byte is padded with
/// zero on the right.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Validates a received datagram as an echo reply addressed to `identifier`.
///
/// Raw sockets deliver the reply wrapped in its IPv4 header while dgram ICMP
/// sockets may deliver the bare ICMP message; both forms are accepted. Any
/// datagram that is not a well-formed echo reply with a zero code and a
/// matching identifier yields `None` (unrelated ICMP traffic is expected on
/// a raw socket and is not an error).
pub fn parse_reply(datagram: &[u8], identifier: u16) -> Option<EchoReply> {
    let icmp = strip_ip_header(datagram)?;
    if icmp.len() < HEADER_SIZE {
        return None;
    }
    if icmp[0] != ICMP_ECHO_REPLY || icmp[1] != 0 {
        return None;
    }
    let id = u16::from_be_bytes([icmp[4], icmp[5]]);
    if id != identifier {
        return None;
    }
    let sequence = u16::from_be_bytes([icmp[6], icmp[7]]);
    Some(EchoReply {
        identifier: id,
        sequence,
    })
}

// An IPv4 header starts with version nibble 4; ICMP echo types (0 and 8)
// never produce that nibble, so the first byte disambiguates the two forms.
fn strip_ip_header(datagram: &[u8]) -> Option<&[u8]> {
    let first = *datagram.first()?;
    if first >> 4 == 4 {
        let header_len = usize::from(first & 0x0F) * 4;
        if header_len < 20 || datagram.len() < header_len {
            return None;
        }
        Some(&datagram[header_len..])
    } else {
        Some(datagram)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_encode_parse_reply_property(id in 0u16..=u16::MAX, seq in 0u16..=u16::MAX) {
            let mut buf = EchoRequest { identifier: id, sequence: seq }.encode();
            buf[0] = ICMP_ECHO_REPLY;
            let parsed = parse_reply(&buf, id).unwrap();
            prop_assert_eq!(parsed.identifier, id);
            prop_assert_eq!(parsed.sequence, seq);
        }

        #[test]
        fn test_checksum_self_verifies_property(id in 0u16..=u16::MAX, seq in 0u16..=u16::MAX) {
            let packet = EchoRequest { identifier: id, sequence: seq }.encode();
            let mut sum: u32 = 0;
            for chunk in packet.chunks_exact(2) {
                sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
            }
            while sum >> 16 != 0 {
                sum = (sum & 0xFFFF) + (sum >> 16);
            }
            prop_assert_eq!(sum, 0xFFFF);
        }
    }
}
