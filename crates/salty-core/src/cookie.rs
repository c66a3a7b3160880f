//! Per-connection random cookies.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

use crate::error::ProtocolError;

/// Cookie length in bytes.
pub const COOKIE_LENGTH: usize = 16;

/// 16 random bytes chosen independently by each side at connection start.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cookie([u8; COOKIE_LENGTH]);

impl Cookie {
    /// Generate a fresh cookie from the OS CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; COOKIE_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; COOKIE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a cookie from a slice, rejecting anything but 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let array: [u8; COOKIE_LENGTH] =
            bytes.try_into().map_err(|_| ProtocolError::InvalidLength {
                what: "cookie",
                expected: COOKIE_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; COOKIE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cookie({})", self.to_hex())
    }
}
