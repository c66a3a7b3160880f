//! Combined sequence numbers.
//!
//! A CSN is a 48-bit counter made of a 16-bit overflow number and a 32-bit
//! sequence number. On the wire it occupies the low 6 bytes of a big-endian
//! `u64`; the top two bytes are always zero.
//!
//! Values above 48 bits are rejected rather than wrapped or truncated.

use std::fmt;

use crate::error::ProtocolError;

/// Encoded CSN length in bytes.
pub const CSN_LENGTH: usize = 6;

/// A 48-bit per-sender sequence counter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CombinedSequence(u64);

impl CombinedSequence {
    /// Largest representable value, `2^48 - 1`.
    pub const MAX: u64 = (1 << 48) - 1;

    /// Initial value that sits right below the 32-bit boundary.
    pub const BOUNDARY_START: u64 = u32::MAX as u64;

    pub fn new(value: u64) -> Result<Self, ProtocolError> {
        if value > Self::MAX {
            return Err(ProtocolError::SequenceViolation(format!(
                "csn {value:#x} exceeds 48 bits"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Upper 16 bits.
    pub fn overflow(self) -> u16 {
        (self.0 >> 32) as u16
    }

    /// Lower 32 bits.
    pub fn sequence(self) -> u32 {
        self.0 as u32
    }

    /// The following value, failing once the counter is exhausted.
    pub fn next(self) -> Result<Self, ProtocolError> {
        if self.0 == Self::MAX {
            return Err(ProtocolError::SequenceViolation(
                "csn exhausted, connection must be re-established".into(),
            ));
        }
        Ok(Self(self.0 + 1))
    }

    pub fn to_bytes(self) -> [u8; CSN_LENGTH] {
        let mut out = [0u8; CSN_LENGTH];
        out.copy_from_slice(&self.0.to_be_bytes()[2..]);
        out
    }

    pub fn from_bytes(bytes: [u8; CSN_LENGTH]) -> Self {
        let mut wide = [0u8; 8];
        wide[2..].copy_from_slice(&bytes);
        Self(u64::from_be_bytes(wide))
    }
}

impl fmt::Display for CombinedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CombinedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Csn({}:{})", self.overflow(), self.sequence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_rolls_into_overflow() {
        let start = CombinedSequence::new(CombinedSequence::BOUNDARY_START).unwrap();
        assert_eq!(start.to_bytes(), [0x00, 0x00, 0xff, 0xff, 0xff, 0xff]);

        let next = start.next().unwrap();
        assert_eq!(next.get(), 1 << 32);
        assert_eq!(next.to_bytes(), [0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(next.overflow(), 1);
        assert_eq!(next.sequence(), 0);
    }

    #[test]
    fn test_rejects_values_above_48_bits() {
        assert!(CombinedSequence::new(CombinedSequence::MAX).is_ok());
        assert!(matches!(
            CombinedSequence::new(CombinedSequence::MAX + 1),
            Err(ProtocolError::SequenceViolation(_))
        ));
    }

    #[test]
    fn test_exhaustion() {
        let last = CombinedSequence::new(CombinedSequence::MAX).unwrap();
        assert!(matches!(last.next(), Err(ProtocolError::SequenceViolation(_))));
    }

    #[test]
    fn test_bytes_roundtrip() {
        for value in [0, 1, 0xdead_beef, 1 << 40, CombinedSequence::MAX] {
            let csn = CombinedSequence::new(value).unwrap();
            assert_eq!(CombinedSequence::from_bytes(csn.to_bytes()), csn);
        }
    }
}
