//! Client side of the relay handshake.
//!
//! This is a sans-IO state machine: it consumes received frames and produces
//! frames to send, but never touches a socket. The caller owns the transport
//! and the timeouts.
//!
//! # Handshake Flow
//!
//! ```text
//! Client                                   Relay
//!     |                                       |
//!     |  <- server-hello {key}                |  plain, relay cookie
//!     |<--------------------------------------|
//!     |                                       |
//!     |  -> client-hello {key}                |  plain, responders only
//!     |-------------------------------------->|
//!     |                                       |
//!     |  -> client-auth {your_cookie, ...}    |  session box
//!     |-------------------------------------->|
//!     |                                       |
//!     |  <- server-auth {signed_keys, ...}    |  session box, our address
//!     |<--------------------------------------|
//! ```
//!
//! Any violation moves the machine to [`HandshakeState::Failed`] and drops
//! the session key material. There are no retries at this layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use salty_common::helpers::constant_time_eq;
use salty_core::{
    Address, ClientAuth, ClientHello, CombinedSequence, Cookie, Message, MessageKind, Nonce,
    PeerStatus, ProtocolError, ServerAuth, NONCE_LENGTH, SUBPROTOCOL_V1,
};
use tracing::{debug, warn};

use crate::envelope::{self, Envelope};
use crate::keys::{KeyPair, KEY_LENGTH};
use crate::shared_box::SharedBox;
use crate::signed_keys::verify_signed_keys;

/// Which side of the signaling path this client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiator => "initiator",
            Self::Responder => "responder",
        }
    }
}

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for server-hello
    AwaitingServerHello,
    /// Received server-hello, client-hello must be sent next (responders)
    SendingClientHello,
    /// client-auth must be sent next
    SendingClientAuth,
    /// Sent client-auth, waiting for server-auth
    AwaitingServerAuth,
    /// Handshake complete
    Established,
    /// A check failed; the machine is unusable
    Failed,
}

/// Caller-supplied handshake parameters.
#[derive(Debug, Clone)]
pub struct HandshakeParams {
    /// Our cookie. A fresh random cookie is used when absent.
    pub cookie: Option<Cookie>,
    pub initial_csn: u64,
    pub subprotocols: Vec<String>,
    pub ping_interval: Option<u32>,
    /// Relay permanent key. Enables `signed_keys` verification.
    pub server_permanent_key: Option<[u8; KEY_LENGTH]>,
    /// Send `server_permanent_key` as `your_key` in client-auth.
    pub explicit_permanent_key: bool,
}

impl Default for HandshakeParams {
    fn default() -> Self {
        Self {
            cookie: None,
            initial_csn: CombinedSequence::BOUNDARY_START,
            subprotocols: vec![SUBPROTOCOL_V1.to_string()],
            ping_interval: None,
            server_permanent_key: None,
            explicit_permanent_key: false,
        }
    }
}

struct ServerInfo {
    cookie: Cookie,
    session_key: [u8; KEY_LENGTH],
    start_csn: CombinedSequence,
}

/// Negotiated session state produced by a successful handshake.
#[derive(Debug)]
pub struct Established {
    pub role: Role,
    /// Address assigned by the relay.
    pub address: Address,
    /// Our cookie.
    pub cookie: Cookie,
    /// Our next outgoing CSN.
    pub csn: CombinedSequence,
    pub server_cookie: Cookie,
    /// CSN of the relay's server-hello.
    pub server_start_csn: CombinedSequence,
    /// CSN of the last relay message received.
    pub server_csn: CombinedSequence,
    pub server_session_key: [u8; KEY_LENGTH],
    pub signed_keys: Option<Vec<u8>>,
    /// Whether `signed_keys` was checked against a known relay permanent key.
    pub signed_keys_verified: bool,
    pub peers: PeerStatus,
    /// Every nonce exchanged during the handshake, by message.
    pub nonces: BTreeMap<MessageKind, [u8; NONCE_LENGTH]>,
    /// Box for further traffic with the relay.
    pub session_box: SharedBox,
}

/// Client handshake driven one frame at a time.
pub struct ClientHandshake {
    role: Role,
    permanent: Arc<KeyPair>,
    params: HandshakeParams,
    state: HandshakeState,
    cookie: Cookie,
    csn: CombinedSequence,
    server: Option<ServerInfo>,
    session_box: Option<SharedBox>,
    sign_box: Option<SharedBox>,
    nonces: BTreeMap<MessageKind, [u8; NONCE_LENGTH]>,
}

impl ClientHandshake {
    pub fn new(
        role: Role,
        permanent: Arc<KeyPair>,
        params: HandshakeParams,
    ) -> Result<Self, ProtocolError> {
        let csn = CombinedSequence::new(params.initial_csn)?;
        if params.explicit_permanent_key && params.server_permanent_key.is_none() {
            return Err(ProtocolError::InvalidState(
                "explicit permanent key requested but none configured",
            ));
        }
        let cookie = params.cookie.unwrap_or_else(Cookie::random);

        Ok(Self {
            role,
            permanent,
            params,
            state: HandshakeState::AwaitingServerHello,
            cookie,
            csn,
            server: None,
            session_box: None,
            sign_box: None,
            nonces: BTreeMap::new(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn cookie(&self) -> &Cookie {
        &self.cookie
    }

    /// Next outgoing CSN.
    pub fn csn(&self) -> CombinedSequence {
        self.csn
    }

    pub fn nonces(&self) -> &BTreeMap<MessageKind, [u8; NONCE_LENGTH]> {
        &self.nonces
    }

    /// Whether any session key material is still held.
    pub fn holds_key_material(&self) -> bool {
        self.session_box.is_some() || self.sign_box.is_some() || self.server.is_some()
    }

    /// Process the relay's server-hello.
    pub fn handle_server_hello(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        let result = self.read_server_hello(frame);
        self.guard(result)
    }

    /// The next frame to send, if the protocol expects one now.
    ///
    /// Responders get client-hello then client-auth; initiators only
    /// client-auth. Returns `None` while waiting for the relay.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let result = match self.state {
            HandshakeState::SendingClientHello => self.write_client_hello().map(Some),
            HandshakeState::SendingClientAuth => self.write_client_auth().map(Some),
            HandshakeState::Failed => Err(ProtocolError::InvalidState("handshake has failed")),
            _ => Ok(None),
        };
        self.guard(result)
    }

    /// Process the relay's server-auth and complete the handshake.
    pub fn handle_server_auth(&mut self, frame: &[u8]) -> Result<Established, ProtocolError> {
        let result = self.read_server_auth(frame);
        self.guard(result)
    }

    /// Abandon the handshake and drop all session key material.
    pub fn abort(&mut self) {
        self.state = HandshakeState::Failed;
        self.session_box = None;
        self.sign_box = None;
        self.server = None;
        self.nonces.clear();
    }

    fn guard<T>(&mut self, result: Result<T, ProtocolError>) -> Result<T, ProtocolError> {
        if let Err(e) = &result {
            warn!(role = self.role.as_str(), state = ?self.state, error = %e, "handshake failed");
            self.abort();
        }
        result
    }

    fn expect_state(&self, expected: HandshakeState) -> Result<(), ProtocolError> {
        if self.state == HandshakeState::Failed {
            return Err(ProtocolError::InvalidState("handshake has failed"));
        }
        if self.state != expected {
            return Err(ProtocolError::InvalidState("message out of order"));
        }
        Ok(())
    }

    fn read_server_hello(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        self.expect_state(HandshakeState::AwaitingServerHello)?;

        let Envelope {
            message,
            nonce,
            raw_nonce,
        } = envelope::unpack(frame, None)?;
        let hello = match message {
            Message::ServerHello(hello) => hello,
            other => {
                return Err(ProtocolError::UnexpectedMessageType {
                    expected: MessageKind::ServerHello.as_str(),
                    actual: other.kind().to_string(),
                })
            }
        };

        if !nonce.source.is_server() {
            return Err(ProtocolError::InvalidAddress {
                field: "server-hello source",
                actual: nonce.source,
            });
        }
        if nonce.destination != Address::UNKNOWN {
            return Err(ProtocolError::InvalidAddress {
                field: "server-hello destination",
                actual: nonce.destination,
            });
        }
        if constant_time_eq(nonce.cookie.as_bytes(), self.cookie.as_bytes()) {
            return Err(ProtocolError::CookieCollision);
        }

        debug!(
            role = self.role.as_str(),
            server_cookie = %nonce.cookie.to_hex(),
            csn = %nonce.csn,
            "received server-hello"
        );

        self.server = Some(ServerInfo {
            cookie: nonce.cookie,
            session_key: hello.key,
            start_csn: nonce.csn,
        });
        self.nonces.insert(MessageKind::ServerHello, raw_nonce);
        self.state = match self.role {
            Role::Responder => HandshakeState::SendingClientHello,
            Role::Initiator => HandshakeState::SendingClientAuth,
        };
        Ok(())
    }

    fn outgoing_nonce(&self) -> Nonce {
        Nonce::new(self.cookie, Address::UNKNOWN, Address::SERVER, self.csn)
    }

    fn write_client_hello(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let nonce = self.outgoing_nonce();
        let message = Message::ClientHello(ClientHello {
            key: self.permanent.public_key(),
        });
        let frame = envelope::pack(&nonce, &message, None)?;

        self.nonces.insert(MessageKind::ClientHello, nonce.encode());
        self.csn = self.csn.next()?;
        self.state = HandshakeState::SendingClientAuth;
        debug!(csn = %nonce.csn, "sending client-hello");
        Ok(frame)
    }

    fn write_client_auth(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let server = self
            .server
            .as_ref()
            .ok_or(ProtocolError::InvalidState("no server-hello recorded"))?;

        let session_box = SharedBox::new(&self.permanent, &server.session_key);
        let your_key = if self.params.explicit_permanent_key {
            self.params.server_permanent_key
        } else {
            None
        };
        let message = Message::ClientAuth(ClientAuth {
            your_cookie: *server.cookie.as_bytes(),
            subprotocols: self.params.subprotocols.clone(),
            ping_interval: self.params.ping_interval,
            your_key,
        });

        let nonce = self.outgoing_nonce();
        let frame = envelope::pack(&nonce, &message, Some(&session_box))?;

        self.sign_box = self
            .params
            .server_permanent_key
            .map(|key| SharedBox::new(&self.permanent, &key));
        self.session_box = Some(session_box);
        self.nonces.insert(MessageKind::ClientAuth, nonce.encode());
        self.csn = self.csn.next()?;
        self.state = HandshakeState::AwaitingServerAuth;
        debug!(csn = %nonce.csn, "sending client-auth");
        Ok(frame)
    }

    fn read_server_auth(&mut self, frame: &[u8]) -> Result<Established, ProtocolError> {
        self.expect_state(HandshakeState::AwaitingServerAuth)?;
        let session_box = self
            .session_box
            .as_ref()
            .ok_or(ProtocolError::InvalidState("no session box"))?;
        let server = self
            .server
            .as_ref()
            .ok_or(ProtocolError::InvalidState("no server-hello recorded"))?;

        let Envelope {
            message,
            nonce,
            raw_nonce,
        } = envelope::unpack(frame, Some(session_box))?;
        let auth = match message {
            Message::ServerAuth(auth) => auth,
            other => {
                return Err(ProtocolError::UnexpectedMessageType {
                    expected: MessageKind::ServerAuth.as_str(),
                    actual: other.kind().to_string(),
                })
            }
        };

        if !nonce.source.is_server() {
            return Err(ProtocolError::InvalidAddress {
                field: "server-auth source",
                actual: nonce.source,
            });
        }
        if !constant_time_eq(nonce.cookie.as_bytes(), server.cookie.as_bytes()) {
            return Err(ProtocolError::CookieMismatch(format!(
                "server-auth cookie {} differs from server-hello cookie {}",
                nonce.cookie.to_hex(),
                server.cookie.to_hex()
            )));
        }
        let expected_csn = server.start_csn.next()?;
        if nonce.csn != expected_csn {
            return Err(ProtocolError::SequenceViolation(format!(
                "server-auth csn {} but expected {}",
                nonce.csn, expected_csn
            )));
        }

        let address = nonce.destination;
        let address_ok = match self.role {
            Role::Initiator => address.is_initiator(),
            Role::Responder => address.is_responder(),
        };
        if !address_ok {
            return Err(ProtocolError::InvalidAddress {
                field: "server-auth destination",
                actual: address,
            });
        }

        let peers = self.check_peers(&auth)?;
        let signed_keys_verified =
            self.check_signed_keys(&auth, &raw_nonce, &server.session_key)?;

        let server_cookie = server.cookie;
        let server_start_csn = server.start_csn;
        let server_session_key = server.session_key;
        let session_box = self
            .session_box
            .take()
            .ok_or(ProtocolError::InvalidState("no session box"))?;

        self.nonces.insert(MessageKind::ServerAuth, raw_nonce);
        self.sign_box = None;
        self.server = None;
        self.state = HandshakeState::Established;

        debug!(
            role = self.role.as_str(),
            address = %address,
            verified = signed_keys_verified,
            "handshake established"
        );

        Ok(Established {
            role: self.role,
            address,
            cookie: self.cookie,
            csn: self.csn,
            server_cookie,
            server_start_csn,
            server_csn: nonce.csn,
            server_session_key,
            signed_keys: auth.signed_keys,
            signed_keys_verified,
            peers,
            nonces: self.nonces.clone(),
            session_box,
        })
    }

    fn check_peers(&self, auth: &ServerAuth) -> Result<PeerStatus, ProtocolError> {
        let peers = auth.peer_status()?;
        match (self.role, &peers) {
            (Role::Initiator, PeerStatus::Responders(responders)) => {
                if let Some(bad) = responders.iter().find(|a| !a.is_responder()) {
                    return Err(ProtocolError::InvalidAddress {
                        field: "server-auth responders",
                        actual: *bad,
                    });
                }
                Ok(peers)
            }
            (Role::Responder, PeerStatus::InitiatorConnected(_)) => Ok(peers),
            (Role::Initiator, _) => Err(ProtocolError::malformed(
                "server-auth for an initiator must list responders",
            )),
            (Role::Responder, _) => Err(ProtocolError::malformed(
                "server-auth for a responder must carry initiator_connected",
            )),
        }
    }

    fn check_signed_keys(
        &self,
        auth: &ServerAuth,
        raw_nonce: &[u8; NONCE_LENGTH],
        session_key: &[u8; KEY_LENGTH],
    ) -> Result<bool, ProtocolError> {
        match (&self.sign_box, &auth.signed_keys) {
            (Some(sign_box), Some(signed_keys)) => {
                verify_signed_keys(
                    sign_box,
                    raw_nonce,
                    signed_keys,
                    session_key,
                    &self.permanent.public_key(),
                )?;
                Ok(true)
            }
            (Some(_), None) => Err(ProtocolError::malformed(
                "server-auth lacks signed_keys although a relay key is pinned",
            )),
            (None, _) => {
                warn!("relay identity not verified: no relay permanent key configured");
                Ok(false)
            }
        }
    }
}
