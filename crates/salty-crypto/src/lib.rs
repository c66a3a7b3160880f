//! Cryptographic layer of the signaling handshake.
//!
//! This crate provides:
//! - Curve25519 key pairs with hex persistence
//! - Shared NaCl boxes (X25519 + XSalsa20-Poly1305)
//! - The envelope codec: nonce header plus optionally sealed payload
//! - Relay identity proofs (`signed_keys`)
//! - The client handshake state machine
//!
//! # Design
//!
//! Every frame carries its own 24-byte nonce, which doubles as the box nonce.
//! Cookies make nonces unique per connection and sequence numbers make them
//! unique per message, so one box can safely seal traffic in both directions.

#![forbid(unsafe_code)]

pub mod envelope;
pub mod handshake;
pub mod keys;
pub mod shared_box;
pub mod signed_keys;

pub use envelope::{pack, pack_raw, unpack, unpack_raw, Envelope};
pub use handshake::{ClientHandshake, Established, HandshakeParams, HandshakeState, Role};
pub use keys::KeyPair;
pub use shared_box::SharedBox;
pub use signed_keys::{seal_signed_keys, verify_signed_keys};
