//! Common error types for salty.

use thiserror::Error;

/// Result type alias using salty's shared error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration and key handling shared across crates.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed key material
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl Error {
    /// Create a serialization error from any displayable type.
    pub fn serialization(msg: impl std::fmt::Display) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Create a config error from any displayable type.
    pub fn config(msg: impl std::fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }

    /// Create an invalid key error from any displayable type.
    pub fn invalid_key(msg: impl std::fmt::Display) -> Self {
        Self::InvalidKey(msg.to_string())
    }
}
