//! Core signaling protocol types, framing, and constants.
//!
//! This crate provides:
//! - Logical addresses and per-connection cookies
//! - 48-bit combined sequence numbers
//! - The fixed 24-byte nonce codec
//! - Handshake message types and their MessagePack encoding
//!
//! Nothing in here touches keys or sockets; see `salty-crypto` for the
//! envelope codec and handshake state machine.

#![forbid(unsafe_code)]

pub mod address;
pub mod cookie;
pub mod csn;
pub mod error;
pub mod message;
pub mod nonce;

pub use address::Address;
pub use cookie::{Cookie, COOKIE_LENGTH};
pub use csn::{CombinedSequence, CSN_LENGTH};
pub use error::ProtocolError;
pub use message::{
    ClientAuth, ClientHello, Message, MessageKind, PeerStatus, ServerAuth, ServerHello,
    KEY_LENGTH, SUBPROTOCOL_V1,
};
pub use nonce::{decode_nonce, encode_nonce, Nonce, NONCE_LENGTH};
