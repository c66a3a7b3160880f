//! Shared-secret boxes.
//!
//! A box is derived from our secret key and a peer's public key and
//! authenticated-encrypts with XSalsa20-Poly1305, using the 24-byte frame
//! nonce directly. Both sides derive the same box, so it works in both
//! directions.

use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox};
use salty_core::{ProtocolError, NONCE_LENGTH};
use std::fmt;

use crate::keys::{KeyPair, KEY_LENGTH};

/// Poly1305 tag length added to every ciphertext.
pub const TAG_LENGTH: usize = 16;

/// Authenticated-encryption context for one (own key, peer key) pair.
pub struct SharedBox {
    inner: SalsaBox,
    peer_key: [u8; KEY_LENGTH],
}

impl SharedBox {
    pub fn new(own: &KeyPair, peer_public: &[u8; KEY_LENGTH]) -> Self {
        let peer = PublicKey::from(*peer_public);
        Self {
            inner: SalsaBox::new(&peer, own.secret()),
            peer_key: *peer_public,
        }
    }

    /// The public key on the other side of this box.
    pub fn peer_key(&self) -> &[u8; KEY_LENGTH] {
        &self.peer_key
    }

    pub fn encrypt(
        &self,
        nonce: &[u8; NONCE_LENGTH],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        self.inner
            .encrypt(GenericArray::from_slice(nonce), plaintext)
            .map_err(|_| ProtocolError::malformed("payload cannot be sealed"))
    }

    /// Fails with `AuthenticationFailure` on any MAC mismatch.
    pub fn decrypt(
        &self,
        nonce: &[u8; NONCE_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        if ciphertext.len() < TAG_LENGTH {
            return Err(ProtocolError::AuthenticationFailure(
                "ciphertext shorter than tag",
            ));
        }
        self.inner
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|_| ProtocolError::AuthenticationFailure("box could not be opened"))
    }
}

impl fmt::Debug for SharedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBox")
            .field("peer_key", &hex::encode(self.peer_key))
            .finish_non_exhaustive()
    }
}
