//! X25519 key pairs.
//!
//! Three kinds of key pair take part in a handshake: each client's permanent
//! identity pair, the relay's per-connection session pair and the relay's
//! permanent pair. All of them are plain Curve25519 pairs, so one type covers
//! them.
//!
//! Keys are stored on disk as a single line of lowercase hex.
//!
//! # Example
//!
//! ```
//! use salty_crypto::keys::KeyPair;
//!
//! let keypair = KeyPair::generate();
//! let path = keypair.public_key_hex();
//! assert_eq!(path.len(), 64);
//! ```

use crypto_box::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use salty_common::helpers::decode_key_hex;
use salty_common::{Error, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Curve25519 key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// A Curve25519 key pair. The secret half is zeroized on drop.
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LENGTH]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self::from_secret_bytes(&bytes)
    }

    /// Create from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8; KEY_LENGTH]) -> Self {
        let secret = SecretKey::from(*bytes);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Create from a hex-encoded secret key.
    pub fn from_secret_hex(input: &str) -> Result<Self> {
        let bytes = Zeroizing::new(decode_key_hex(input)?);
        Ok(Self::from_secret_bytes(&bytes))
    }

    pub fn public_key(&self) -> [u8; KEY_LENGTH] {
        *self.public.as_bytes()
    }

    /// Hex-encoded public key, as used in the relay URL path.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public.as_bytes())
    }

    /// Hex-encoded secret key.
    ///
    /// # Security
    /// Handle with care! This recreates the identity.
    pub fn secret_key_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.secret.to_bytes());
        Zeroizing::new(hex::encode(bytes.as_ref()))
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Save the secret key as hex.
    ///
    /// The file is created with restricted permissions (0600 on Unix).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut line = self.secret_key_hex();
        line.push('\n');
        fs::write(path, line.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Load a key pair from a hex secret key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = Zeroizing::new(fs::read_to_string(path)?);
        Self::from_secret_hex(&text)
            .map_err(|e| Error::invalid_key(format!("{}: {e}", path.display())))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
