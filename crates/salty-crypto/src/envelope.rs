//! Envelope codec.
//!
//! # Wire Format
//!
//! ```text
//! [24 bytes: nonce] [payload]
//! ```
//!
//! The payload is the MessagePack-encoded message, sealed with a
//! [`SharedBox`] under the same 24-byte nonce once a box exists. Only the
//! bootstrap messages (`server-hello`, `client-hello`) travel in the clear.

use salty_core::{Message, Nonce, ProtocolError, NONCE_LENGTH};

use crate::shared_box::SharedBox;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message: Message,
    pub nonce: Nonce,
    /// The nonce exactly as it appeared on the wire.
    pub raw_nonce: [u8; NONCE_LENGTH],
}

/// Serialize `message`, seal it when a box is given, and prepend the nonce.
pub fn pack(
    nonce: &Nonce,
    message: &Message,
    sealing: Option<&SharedBox>,
) -> Result<Vec<u8>, ProtocolError> {
    let payload = message.to_msgpack()?;
    pack_raw(nonce, &payload, sealing)
}

/// Like [`pack`] for an already-serialized payload.
pub fn pack_raw(
    nonce: &Nonce,
    payload: &[u8],
    sealing: Option<&SharedBox>,
) -> Result<Vec<u8>, ProtocolError> {
    let raw_nonce = nonce.encode();
    let body = match sealing {
        Some(sealing) => sealing.encrypt(&raw_nonce, payload)?,
        None => payload.to_vec(),
    };

    let mut frame = Vec::with_capacity(NONCE_LENGTH + body.len());
    frame.extend_from_slice(&raw_nonce);
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Split off and decode the nonce, open the payload, and return the
/// plaintext bytes.
pub fn unpack_raw(
    frame: &[u8],
    sealing: Option<&SharedBox>,
) -> Result<(Nonce, [u8; NONCE_LENGTH], Vec<u8>), ProtocolError> {
    if frame.len() < NONCE_LENGTH {
        return Err(ProtocolError::InvalidLength {
            what: "frame",
            expected: NONCE_LENGTH,
            actual: frame.len(),
        });
    }

    let (head, body) = frame.split_at(NONCE_LENGTH);
    let nonce = Nonce::decode(head)?;
    let mut raw_nonce = [0u8; NONCE_LENGTH];
    raw_nonce.copy_from_slice(head);

    let plaintext = match sealing {
        Some(sealing) => sealing.decrypt(&raw_nonce, body)?,
        None => body.to_vec(),
    };
    Ok((nonce, raw_nonce, plaintext))
}

/// Decode a full frame into a validated [`Envelope`].
pub fn unpack(frame: &[u8], sealing: Option<&SharedBox>) -> Result<Envelope, ProtocolError> {
    let (nonce, raw_nonce, plaintext) = unpack_raw(frame, sealing)?;
    let message = Message::from_msgpack(&plaintext)?;
    Ok(Envelope {
        message,
        nonce,
        raw_nonce,
    })
}
