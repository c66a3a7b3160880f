//! Logical addresses on a relay connection.
//!
//! ```text
//! 0x00        relay (also "not yet assigned")
//! 0x01        initiator
//! 0x02..0xff  responders, assigned by the relay
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit logical identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u8);

impl Address {
    /// The relay itself.
    pub const SERVER: Address = Address(0x00);
    /// Placeholder used before the relay assigned an address.
    pub const UNKNOWN: Address = Address(0x00);
    /// The initiator role.
    pub const INITIATOR: Address = Address(0x01);

    pub fn is_server(self) -> bool {
        self.0 == 0x00
    }

    pub fn is_initiator(self) -> bool {
        self.0 == 0x01
    }

    pub fn is_responder(self) -> bool {
        self.0 >= 0x02
    }
}

impl From<u8> for Address {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Address> for u8 {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{:02x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_ranges() {
        assert!(Address::SERVER.is_server());
        assert!(Address::INITIATOR.is_initiator());
        assert!(!Address::INITIATOR.is_responder());
        assert!(Address(0x02).is_responder());
        assert!(Address(0xff).is_responder());
    }

    #[test]
    fn test_display() {
        assert_eq!(Address(0x02).to_string(), "0x02");
        assert_eq!(Address::SERVER.to_string(), "0x00");
    }
}
