//! Common helper functions for salty.

use crate::error::{Error, Result};

/// Performs a constant-time comparison of two byte strings.
/// Used when comparing cookies and key material received from the network.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (lhs, rhs) in a.iter().zip(b.iter()) {
        diff |= lhs ^ rhs;
    }
    diff == 0
}

/// Decode a hex-encoded 32-byte key, ignoring surrounding whitespace.
pub fn decode_key_hex(input: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(input.trim()).map_err(Error::invalid_key)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::invalid_key(format!("expected 32 bytes, got {}", bytes.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq_identical() {
        assert!(constant_time_eq(b"cookie123", b"cookie123"));
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(&[0xff; 16], &[0xff; 16]));
    }

    #[test]
    fn test_constant_time_eq_different() {
        assert!(!constant_time_eq(b"cookie123", b"cookie124"));
        assert!(!constant_time_eq(&[0u8; 16], &[1u8; 16]));
        assert!(!constant_time_eq(b"", b"a"));
    }

    #[test]
    fn test_constant_time_eq_different_lengths() {
        assert!(!constant_time_eq(b"short", b"much_longer_string"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn test_decode_key_hex() {
        let key = decode_key_hex(
            "  b452e8a5abf54c5258db323b88d03cb9e002a4a84ba6f37715678901c20411c7\n",
        )
        .unwrap();
        assert_eq!(key[0], 0xb4);
        assert_eq!(key[31], 0xc7);

        assert!(matches!(decode_key_hex("abcd"), Err(Error::InvalidKey(_))));
        assert!(matches!(decode_key_hex("zz"), Err(Error::InvalidKey(_))));
    }
}
