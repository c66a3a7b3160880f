//! Client error types.

use salty_core::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the handshake driver and the signaling channel.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay violated the protocol. Always fatal for the connection.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Nothing arrived within the configured timeout.
    #[error("timed out waiting for {stage}")]
    Timeout { stage: &'static str },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Config(#[from] salty_common::Error),
}

impl ClientError {
    pub fn transport(msg: impl std::fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::ConnectionClosed,
            other => Self::Transport(other.to_string()),
        }
    }
}
