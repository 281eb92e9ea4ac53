use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Transport protocol carried by a decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    /// Any other IP protocol, identified by its protocol number.
    Other(u8),
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportProtocol::Tcp => write!(f, "tcp"),
            TransportProtocol::Udp => write!(f, "udp"),
            TransportProtocol::Other(n) => write!(f, "proto-{n}"),
        }
    }
}

/// The cipher-suite field of a TLS handshake as it arrives from a decoder.
///
/// Upstream decoders emit this field in several shapes: a single token, a
/// whitespace-joined string, a comma-joined string, or a list of tokens whose
/// elements may themselves be comma-joined. The classifier normalizes all of
/// them; none of the shapes is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherSuiteField {
    /// A single string, possibly holding several whitespace- or
    /// comma-separated codes.
    Text(String),
    /// An already-split list of tokens.
    List(Vec<String>),
}

/// TLS handshake fields relevant to cipher-suite classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsHandshakeView {
    /// TLS handshake message type (1 = ClientHello, 2 = ServerHello).
    pub handshake_type: u8,
    /// Offered (ClientHello) or selected (ServerHello) cipher suites.
    pub cipher_suites: Option<CipherSuiteField>,
}

/// TLS handshake message type: ClientHello.
pub const HANDSHAKE_CLIENT_HELLO: u8 = 1;
/// TLS handshake message type: ServerHello.
pub const HANDSHAKE_SERVER_HELLO: u8 = 2;

/// One decoded packet, as consumed by the aggregation pipeline.
///
/// Every field is optional: a missing field contributes nothing downstream
/// and is never an error. Records with incomplete addressing end up in the
/// shared unknown-key session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketRecord {
    /// Capture timestamp, when the source provides one.
    pub timestamp: Option<Duration>,
    pub src_addr: Option<IpAddr>,
    pub dst_addr: Option<IpAddr>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub transport: Option<TransportProtocol>,
    /// Raw application payload carried by this packet, possibly empty.
    pub payload: Option<Vec<u8>>,
    /// TLS handshake fields, when the payload carried a handshake record.
    pub tls: Option<TlsHandshakeView>,
}

impl PacketRecord {
    /// A record with no decodable fields. It aggregates under the unknown
    /// key with zero payload bytes, so undecodable frames are still counted.
    pub fn unknown() -> Self {
        PacketRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_record_has_no_fields() {
        let record = PacketRecord::unknown();
        assert!(record.src_addr.is_none());
        assert!(record.payload.is_none());
        assert!(record.tls.is_none());
    }

    #[test]
    fn test_transport_protocol_display() {
        assert_eq!(TransportProtocol::Tcp.to_string(), "tcp");
        assert_eq!(TransportProtocol::Udp.to_string(), "udp");
        assert_eq!(TransportProtocol::Other(47).to_string(), "proto-47");
    }
}
