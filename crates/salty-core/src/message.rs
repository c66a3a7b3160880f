//! Handshake messages.
//!
//! Messages are MessagePack maps keyed by field name with a mandatory `type`
//! discriminator. Byte fields travel as MessagePack `bin`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::cookie::COOKIE_LENGTH;
use crate::error::ProtocolError;

/// Public key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// The only sub-protocol token spoken by this implementation.
pub const SUBPROTOCOL_V1: &str = "v1.saltyrtc.org";

/// The four handshake message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    ServerHello,
    ClientHello,
    ClientAuth,
    ServerAuth,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServerHello => "server-hello",
            Self::ClientHello => "client-hello",
            Self::ClientAuth => "client-auth",
            Self::ServerAuth => "server-auth",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server-hello" => Ok(Self::ServerHello),
            "client-hello" => Ok(Self::ClientHello),
            "client-auth" => Ok(Self::ClientAuth),
            "server-auth" => Ok(Self::ServerAuth),
            other => Err(ProtocolError::malformed(format!(
                "unknown message type {other:?}"
            ))),
        }
    }
}

/// `server-hello`: the relay's session public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHello {
    #[serde(with = "serde_bytes")]
    pub key: [u8; KEY_LENGTH],
}

/// `client-hello`: a responder's permanent public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHello {
    #[serde(with = "serde_bytes")]
    pub key: [u8; KEY_LENGTH],
}

/// `client-auth`: proves possession of the relay cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuth {
    #[serde(with = "serde_bytes")]
    pub your_cookie: [u8; COOKIE_LENGTH],
    pub subprotocols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_interval: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_bytes"
    )]
    pub your_key: Option<[u8; KEY_LENGTH]>,
}

/// `server-auth`: completes the handshake.
///
/// Exactly one of `responders` (initiator path) or `initiator_connected`
/// (responder path) is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAuth {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_bytes"
    )]
    pub signed_keys: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responders: Option<Vec<Address>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_connected: Option<bool>,
}

/// Who else is on the path, as reported by `server-auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerStatus {
    /// Responders currently connected (initiator view).
    Responders(Vec<Address>),
    /// Whether an initiator is connected (responder view).
    InitiatorConnected(bool),
}

impl ServerAuth {
    pub fn peer_status(&self) -> Result<PeerStatus, ProtocolError> {
        match (&self.responders, self.initiator_connected) {
            (Some(responders), None) => Ok(PeerStatus::Responders(responders.clone())),
            (None, Some(connected)) => Ok(PeerStatus::InitiatorConnected(connected)),
            (Some(_), Some(_)) => Err(ProtocolError::malformed(
                "server-auth carries both responders and initiator_connected",
            )),
            (None, None) => Err(ProtocolError::malformed(
                "server-auth carries neither responders nor initiator_connected",
            )),
        }
    }
}

/// A handshake message, one shape per `type` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "server-hello")]
    ServerHello(ServerHello),
    #[serde(rename = "client-hello")]
    ClientHello(ClientHello),
    #[serde(rename = "client-auth")]
    ClientAuth(ClientAuth),
    #[serde(rename = "server-auth")]
    ServerAuth(ServerAuth),
}

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "type")]
    kind: String,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::ServerHello(_) => MessageKind::ServerHello,
            Self::ClientHello(_) => MessageKind::ClientHello,
            Self::ClientAuth(_) => MessageKind::ClientAuth,
            Self::ServerAuth(_) => MessageKind::ServerAuth,
        }
    }

    /// Serialize as a field-name keyed MessagePack map.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec_named(self).map_err(ProtocolError::malformed)
    }

    /// Deserialize and validate against the shape of its `type`.
    pub fn from_msgpack(data: &[u8]) -> Result<Self, ProtocolError> {
        let tag: TypeTag = rmp_serde::from_slice(data)
            .map_err(|e| ProtocolError::malformed(format!("missing type field: {e}")))?;
        let kind: MessageKind = tag.kind.parse()?;

        rmp_serde::from_slice(data)
            .map_err(|e| ProtocolError::malformed(format!("invalid {kind}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_auth_roundtrip() {
        let msg = Message::ClientAuth(ClientAuth {
            your_cookie: [3u8; 16],
            subprotocols: vec![SUBPROTOCOL_V1.to_string()],
            ping_interval: Some(30),
            your_key: Some([9u8; 32]),
        });

        let data = msg.to_msgpack().unwrap();
        assert_eq!(Message::from_msgpack(&data).unwrap(), msg);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let msg = Message::ClientAuth(ClientAuth {
            your_cookie: [3u8; 16],
            subprotocols: vec![],
            ping_interval: None,
            your_key: None,
        });

        let data = msg.to_msgpack().unwrap();
        let text = String::from_utf8_lossy(&data);
        assert!(!text.contains("ping_interval"));
        assert!(!text.contains("your_key"));
        assert_eq!(Message::from_msgpack(&data).unwrap(), msg);
    }

    #[test]
    fn test_type_tag_is_a_string() {
        let msg = Message::ServerHello(ServerHello { key: [1u8; 32] });
        let data = msg.to_msgpack().unwrap();

        let tag: TypeTag = rmp_serde::from_slice(&data).unwrap();
        assert_eq!(tag.kind, "server-hello");
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        #[derive(Serialize)]
        struct Bogus {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        let data = rmp_serde::to_vec_named(&Bogus { kind: "new-responder" }).unwrap();

        let err = Message::from_msgpack(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage(m) if m.contains("new-responder")));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        #[derive(Serialize)]
        struct ShortKey {
            #[serde(rename = "type")]
            kind: &'static str,
            #[serde(with = "serde_bytes")]
            key: Vec<u8>,
        }
        let data = rmp_serde::to_vec_named(&ShortKey {
            kind: "server-hello",
            key: vec![0u8; 31],
        })
        .unwrap();

        let err = Message::from_msgpack(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage(m) if m.contains("server-hello")));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            Message::from_msgpack(&[0xc1, 0x00, 0x13]),
            Err(ProtocolError::MalformedMessage(_))
        ));
        assert!(Message::from_msgpack(&[]).is_err());
    }

    #[test]
    fn test_peer_status() {
        let auth = ServerAuth {
            signed_keys: None,
            responders: Some(vec![Address(0x02), Address(0x03)]),
            initiator_connected: None,
        };
        assert_eq!(
            auth.peer_status().unwrap(),
            PeerStatus::Responders(vec![Address(0x02), Address(0x03)])
        );

        let both = ServerAuth {
            initiator_connected: Some(true),
            ..auth
        };
        assert!(both.peer_status().is_err());
    }
}
