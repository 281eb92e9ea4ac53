use pnet::packet::ethernet::EtherType;
use thiserror::Error;

/// Error handling during frame decoding and capture-file ingestion.
#[derive(Error, Debug)]
pub enum FlowLensError {
    /// An error occurred while parsing data.
    ///
    /// This variant is used when a parsing operation fails.
    /// The associated string provides additional context about the error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An unsupported transport protocol was encountered.
    ///
    /// The associated string specifies the unsupported protocol.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// An unsupported Ethernet type was encountered.
    ///
    /// The associated value specifies the unsupported Ethernet type.
    #[error("Unsupported ethernet type: {0}")]
    UnsupportedEthernetType(EtherType),

    /// A truncated or otherwise invalid packet was encountered.
    ///
    /// The associated string provides details about the invalid packet.
    #[error("Invalid packet: {0}")]
    UnexpectedPacket(String),

    /// A capture file could not be read.
    #[error("Capture error: {0}")]
    Capture(String),

    /// An I/O error occurred while opening or reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
