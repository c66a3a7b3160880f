//! Relay identity proof carried in `server-auth`.
//!
//! The relay seals `session_public_key ‖ client_permanent_key` with the box
//! between its permanent key and the client's permanent key, using the
//! `server-auth` nonce. A client that knows the relay's permanent key opens
//! it with its sign box and compares both halves.

use salty_common::helpers::constant_time_eq;
use salty_core::{ProtocolError, NONCE_LENGTH};

use crate::keys::KEY_LENGTH;
use crate::shared_box::{SharedBox, TAG_LENGTH};

/// Length of a sealed proof.
pub const SIGNED_KEYS_LENGTH: usize = 2 * KEY_LENGTH + TAG_LENGTH;

/// Produce the proof (relay side).
pub fn seal_signed_keys(
    sign_box: &SharedBox,
    nonce: &[u8; NONCE_LENGTH],
    session_key: &[u8; KEY_LENGTH],
    client_key: &[u8; KEY_LENGTH],
) -> Result<Vec<u8>, ProtocolError> {
    let mut plaintext = [0u8; 2 * KEY_LENGTH];
    plaintext[..KEY_LENGTH].copy_from_slice(session_key);
    plaintext[KEY_LENGTH..].copy_from_slice(client_key);
    sign_box.encrypt(nonce, &plaintext)
}

/// Check the proof (client side).
pub fn verify_signed_keys(
    sign_box: &SharedBox,
    nonce: &[u8; NONCE_LENGTH],
    signed_keys: &[u8],
    session_key: &[u8; KEY_LENGTH],
    client_key: &[u8; KEY_LENGTH],
) -> Result<(), ProtocolError> {
    if signed_keys.len() != SIGNED_KEYS_LENGTH {
        return Err(ProtocolError::InvalidLength {
            what: "signed_keys",
            expected: SIGNED_KEYS_LENGTH,
            actual: signed_keys.len(),
        });
    }

    let plaintext = sign_box.decrypt(nonce, signed_keys)?;
    let (claimed_session, claimed_client) = plaintext.split_at(KEY_LENGTH);

    if !constant_time_eq(claimed_session, session_key) {
        return Err(ProtocolError::AuthenticationFailure(
            "signed_keys names a different session key",
        ));
    }
    if !constant_time_eq(claimed_client, client_key) {
        return Err(ProtocolError::AuthenticationFailure(
            "signed_keys names a different client key",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    struct Fixture {
        relay_permanent: KeyPair,
        relay_session: KeyPair,
        client: KeyPair,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                relay_permanent: KeyPair::generate(),
                relay_session: KeyPair::generate(),
                client: KeyPair::generate(),
            }
        }

        fn seal(&self, nonce: &[u8; NONCE_LENGTH]) -> Vec<u8> {
            let relay_box = SharedBox::new(&self.relay_permanent, &self.client.public_key());
            seal_signed_keys(
                &relay_box,
                nonce,
                &self.relay_session.public_key(),
                &self.client.public_key(),
            )
            .unwrap()
        }

        fn verify(&self, nonce: &[u8; NONCE_LENGTH], proof: &[u8]) -> Result<(), ProtocolError> {
            let sign_box = SharedBox::new(&self.client, &self.relay_permanent.public_key());
            verify_signed_keys(
                &sign_box,
                nonce,
                proof,
                &self.relay_session.public_key(),
                &self.client.public_key(),
            )
        }
    }

    #[test]
    fn test_valid_proof() {
        let fixture = Fixture::new();
        let nonce = [4u8; NONCE_LENGTH];
        let proof = fixture.seal(&nonce);

        assert_eq!(proof.len(), SIGNED_KEYS_LENGTH);
        fixture.verify(&nonce, &proof).unwrap();
    }

    #[test]
    fn test_proof_bound_to_nonce() {
        let fixture = Fixture::new();
        let proof = fixture.seal(&[4u8; NONCE_LENGTH]);

        assert!(matches!(
            fixture.verify(&[5u8; NONCE_LENGTH], &proof),
            Err(ProtocolError::AuthenticationFailure(_))
        ));
    }

    #[test]
    fn test_impostor_relay_rejected() {
        let fixture = Fixture::new();
        let impostor = Fixture {
            relay_permanent: KeyPair::generate(),
            relay_session: KeyPair::from_secret_hex(&fixture.relay_session.secret_key_hex())
                .unwrap(),
            client: KeyPair::from_secret_hex(&fixture.client.secret_key_hex()).unwrap(),
        };
        let nonce = [4u8; NONCE_LENGTH];
        let proof = impostor.seal(&nonce);

        assert!(fixture.verify(&nonce, &proof).is_err());
    }

    #[test]
    fn test_wrong_session_key_rejected() {
        let fixture = Fixture::new();
        let nonce = [4u8; NONCE_LENGTH];
        let relay_box = SharedBox::new(&fixture.relay_permanent, &fixture.client.public_key());
        let proof = seal_signed_keys(
            &relay_box,
            &nonce,
            &KeyPair::generate().public_key(),
            &fixture.client.public_key(),
        )
        .unwrap();

        let err = fixture.verify(&nonce, &proof).unwrap_err();
        assert!(matches!(err, ProtocolError::AuthenticationFailure(m) if m.contains("session")));
    }

    #[test]
    fn test_wrong_length() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.verify(&[0u8; NONCE_LENGTH], &[0u8; 10]),
            Err(ProtocolError::InvalidLength { .. })
        ));
    }
}
