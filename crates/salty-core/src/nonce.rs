//! Fixed-layout 24-byte nonce.
//!
//! Every frame on a relay connection starts with this nonce. When the payload
//! is encrypted, the same 24 bytes are used as the XSalsa20-Poly1305 nonce.
//!
//! # Layout
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                            Cookie                             |
//! |                          (16 bytes)                           |
//! |                                                               |
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    Source     |  Destination  |        Overflow Number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use crate::address::Address;
use crate::cookie::{Cookie, COOKIE_LENGTH};
use crate::csn::{CombinedSequence, CSN_LENGTH};
use crate::error::ProtocolError;

/// Nonce length in bytes.
pub const NONCE_LENGTH: usize = COOKIE_LENGTH + 1 + 1 + CSN_LENGTH;

/// Decoded nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce {
    pub cookie: Cookie,
    pub source: Address,
    pub destination: Address,
    pub csn: CombinedSequence,
}

impl Nonce {
    pub fn new(
        cookie: Cookie,
        source: Address,
        destination: Address,
        csn: CombinedSequence,
    ) -> Self {
        Self {
            cookie,
            source,
            destination,
            csn,
        }
    }

    /// Encode to the 24-byte wire form.
    pub fn encode(&self) -> [u8; NONCE_LENGTH] {
        let mut buf = [0u8; NONCE_LENGTH];
        buf[..16].copy_from_slice(self.cookie.as_bytes());
        buf[16] = self.source.0;
        buf[17] = self.destination.0;
        buf[18..].copy_from_slice(&self.csn.to_bytes());
        buf
    }

    /// Decode from exactly 24 bytes.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() != NONCE_LENGTH {
            return Err(ProtocolError::InvalidLength {
                what: "nonce",
                expected: NONCE_LENGTH,
                actual: buf.len(),
            });
        }

        let cookie = Cookie::from_slice(&buf[..16])?;
        let mut csn = [0u8; CSN_LENGTH];
        csn.copy_from_slice(&buf[18..]);

        Ok(Self {
            cookie,
            source: Address(buf[16]),
            destination: Address(buf[17]),
            csn: CombinedSequence::from_bytes(csn),
        })
    }
}

/// Encode raw nonce parts.
///
/// Fails with `InvalidLength` for a cookie that is not 16 bytes and with
/// `SequenceViolation` for a CSN above 48 bits.
pub fn encode_nonce(
    cookie: &[u8],
    source: u8,
    destination: u8,
    csn: u64,
) -> Result<[u8; NONCE_LENGTH], ProtocolError> {
    let nonce = Nonce::new(
        Cookie::from_slice(cookie)?,
        Address(source),
        Address(destination),
        CombinedSequence::new(csn)?,
    );
    Ok(nonce.encode())
}

/// Decode a nonce into its raw parts.
pub fn decode_nonce(buf: &[u8]) -> Result<(Cookie, u8, u8, u64), ProtocolError> {
    let nonce = Nonce::decode(buf)?;
    Ok((
        nonce.cookie,
        nonce.source.0,
        nonce.destination.0,
        nonce.csn.get(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_roundtrip() {
        let cookie = Cookie::random();
        let cases = [
            (0x00, 0x00, 0),
            (0x01, 0x00, 1),
            (0x02, 0x01, CombinedSequence::BOUNDARY_START),
            (0xff, 0x02, CombinedSequence::MAX),
        ];

        for (source, destination, csn) in cases {
            let encoded = encode_nonce(cookie.as_bytes(), source, destination, csn).unwrap();
            let decoded = decode_nonce(&encoded).unwrap();
            assert_eq!(decoded, (cookie, source, destination, csn));
        }
    }

    #[test]
    fn test_layout() {
        let cookie = Cookie::from_bytes([0xaa; 16]);
        let encoded = encode_nonce(cookie.as_bytes(), 0x01, 0x02, 1 << 32).unwrap();

        assert_eq!(&encoded[..16], &[0xaa; 16]);
        assert_eq!(encoded[16], 0x01);
        assert_eq!(encoded[17], 0x02);
        assert_eq!(&encoded[18..], &[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(matches!(
            encode_nonce(&[0u8; 17], 0, 0, 0),
            Err(ProtocolError::InvalidLength { what: "cookie", .. })
        ));
        assert!(matches!(
            Nonce::decode(&[0u8; 23]),
            Err(ProtocolError::InvalidLength {
                what: "nonce",
                expected: 24,
                actual: 23
            })
        ));
        assert!(Nonce::decode(&[0u8; 25]).is_err());
    }

    #[test]
    fn test_oversized_csn_rejected() {
        let result = encode_nonce(&[0u8; 16], 0, 0, 1 << 48);
        assert!(matches!(result, Err(ProtocolError::SequenceViolation(_))));
    }
}
