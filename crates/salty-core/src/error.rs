//! Protocol error taxonomy shared by the codecs and the handshake.

use thiserror::Error;

/// Errors raised while encoding, decoding or validating signaling frames.
///
/// Every variant is fatal for the handshake attempt that produced it.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailure(&'static str),

    #[error("cookie collision: peer cookie equals our own")]
    CookieCollision,

    #[error("cookie mismatch: {0}")]
    CookieMismatch(String),

    #[error("sequence violation: {0}")]
    SequenceViolation(String),

    #[error("unexpected message type: expected {expected}, got {actual}")]
    UnexpectedMessageType {
        expected: &'static str,
        actual: String,
    },

    #[error("invalid address in {field}: {actual}")]
    InvalidAddress {
        field: &'static str,
        actual: crate::Address,
    },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl ProtocolError {
    /// Create a malformed message error from any displayable type.
    pub fn malformed(msg: impl std::fmt::Display) -> Self {
        Self::MalformedMessage(msg.to_string())
    }

    /// Whether this error indicates tampering or a key mismatch.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailure(_) | Self::CookieCollision | Self::CookieMismatch(_)
        )
    }
}
