//! Cipher-suite extraction from TLS handshake records.

use crate::error::FlowLensError;
use crate::packet::{
    CipherSuiteField, TlsHandshakeView, HANDSHAKE_CLIENT_HELLO, HANDSHAKE_SERVER_HELLO,
};
use tls_parser::{parse_tls_plaintext, TlsMessage, TlsMessageHandshake};
use tracing::debug;

/// TLS record content type for handshake messages.
const TLS_RECORD_HANDSHAKE: u8 = 0x16;

/// Cheap pre-filter: does this TCP payload start with a TLS handshake
/// record header?
pub fn looks_like_handshake(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == TLS_RECORD_HANDSHAKE && data[1] == 0x03
}

/// Parses a TLS plaintext record and extracts the cipher suites of the first
/// ClientHello or ServerHello it carries.
///
/// ClientHello yields the full offered list, ServerHello the single selected
/// suite. GREASE values are kept; the classifier maps them to `Unknown`.
pub fn extract_handshake(data: &[u8]) -> Result<TlsHandshakeView, FlowLensError> {
    let (_remaining, record) = parse_tls_plaintext(data).map_err(|e| {
        debug!("failed to parse TLS record: {:?}", e);
        FlowLensError::Parse(format!("TLS record parsing failed: {e:?}"))
    })?;

    for message in &record.msg {
        if let TlsMessage::Handshake(handshake) = message {
            match handshake {
                TlsMessageHandshake::ClientHello(client_hello) => {
                    let codes: Vec<String> = client_hello
                        .ciphers
                        .iter()
                        .map(|c| format!("{:04x}", c.0))
                        .collect();
                    debug!("ClientHello with {} cipher suites", codes.len());
                    return Ok(TlsHandshakeView {
                        handshake_type: HANDSHAKE_CLIENT_HELLO,
                        cipher_suites: if codes.is_empty() {
                            None
                        } else {
                            Some(CipherSuiteField::List(codes))
                        },
                    });
                }
                TlsMessageHandshake::ServerHello(server_hello) => {
                    let code = format!("{:04x}", server_hello.cipher.0);
                    debug!("ServerHello selected cipher suite {code}");
                    return Ok(TlsHandshakeView {
                        handshake_type: HANDSHAKE_SERVER_HELLO,
                        cipher_suites: Some(CipherSuiteField::Text(code)),
                    });
                }
                _ => {}
            }
        }
    }

    Err(FlowLensError::Parse(
        "no ClientHello or ServerHello in TLS record".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal TLS 1.2 ClientHello record offering `ciphers`.
    fn client_hello_record(ciphers: &[u16]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]); // client version
        body.extend_from_slice(&[0u8; 32]); // random
        body.push(0); // session id length
        let cs_len = (ciphers.len() * 2) as u16;
        body.extend_from_slice(&cs_len.to_be_bytes());
        for c in ciphers {
            body.extend_from_slice(&c.to_be_bytes());
        }
        body.push(1); // compression methods length
        body.push(0); // null compression

        let mut handshake = vec![0x01]; // ClientHello
        let len = body.len() as u32;
        handshake.extend_from_slice(&len.to_be_bytes()[1..]);
        handshake.extend_from_slice(&body);

        let mut record = vec![0x16, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);
        record
    }

    /// Builds a minimal TLS 1.2 ServerHello record selecting `cipher`.
    fn server_hello_record(cipher: u16) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]);
        body.extend_from_slice(&[0u8; 32]);
        body.push(0); // session id length
        body.extend_from_slice(&cipher.to_be_bytes());
        body.push(0); // null compression

        let mut handshake = vec![0x02]; // ServerHello
        let len = body.len() as u32;
        handshake.extend_from_slice(&len.to_be_bytes()[1..]);
        handshake.extend_from_slice(&body);

        let mut record = vec![0x16, 0x03, 0x03];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);
        record
    }

    #[test]
    fn test_looks_like_handshake() {
        assert!(looks_like_handshake(&client_hello_record(&[0x1301])));
        assert!(!looks_like_handshake(b"GET / HTTP/1.1\r\n"));
        assert!(!looks_like_handshake(b"\x16"));
        // Application data record, not handshake.
        assert!(!looks_like_handshake(&[0x17, 0x03, 0x03, 0x00, 0x00]));
    }

    #[test]
    fn test_extract_client_hello_ciphers() {
        let record = client_hello_record(&[0x1301, 0x1302, 0xc02f]);
        let view = extract_handshake(&record).expect("should parse");
        assert_eq!(view.handshake_type, HANDSHAKE_CLIENT_HELLO);
        assert_eq!(
            view.cipher_suites,
            Some(CipherSuiteField::List(vec![
                "1301".to_string(),
                "1302".to_string(),
                "c02f".to_string(),
            ]))
        );
    }

    #[test]
    fn test_extract_server_hello_cipher() {
        let record = server_hello_record(0xc02b);
        let view = extract_handshake(&record).expect("should parse");
        assert_eq!(view.handshake_type, HANDSHAKE_SERVER_HELLO);
        assert_eq!(
            view.cipher_suites,
            Some(CipherSuiteField::Text("c02b".to_string()))
        );
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_handshake(b"not a tls record at all").is_err());
    }
}
