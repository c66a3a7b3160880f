//! Post-handshake signaling channel to the relay.
//!
//! Every outgoing frame carries our cookie and the next CSN; every incoming
//! frame must carry the relay's cookie and exactly the next relay CSN. The
//! first violation poisons the channel.

use std::time::Duration;

use salty_common::helpers::constant_time_eq;
use salty_core::{Address, Message, Nonce, PeerStatus, ProtocolError, NONCE_LENGTH};
use salty_crypto::envelope::{self, Envelope};
use salty_crypto::{Established, SharedBox};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::helpers::with_timeout;
use crate::transport::Transport;

/// Which box seals or opens a frame.
#[derive(Debug, Clone, Copy)]
pub enum Sealing<'a> {
    /// The session box negotiated during the handshake.
    Session,
    /// A caller-supplied box.
    With(&'a SharedBox),
    /// No encryption.
    Plain,
}

/// An established connection to the relay.
#[derive(Debug)]
pub struct SignalingChannel<T> {
    transport: T,
    session: Established,
    timeout: Duration,
    poisoned: bool,
}

impl<T: Transport> SignalingChannel<T> {
    pub(crate) fn new(transport: T, session: Established, timeout: Duration) -> Self {
        Self {
            transport,
            session,
            timeout,
            poisoned: false,
        }
    }

    /// Negotiated session state.
    pub fn session(&self) -> &Established {
        &self.session
    }

    /// Address the relay assigned to us.
    pub fn address(&self) -> Address {
        self.session.address
    }

    pub fn peers(&self) -> &PeerStatus {
        &self.session.peers
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a message to the relay.
    pub async fn send(
        &mut self,
        message: &Message,
        sealing: Sealing<'_>,
    ) -> Result<(), ClientError> {
        let payload = message.to_msgpack()?;
        self.send_raw(&payload, sealing).await
    }

    /// Send an already-serialized payload to the relay.
    pub async fn send_raw(
        &mut self,
        payload: &[u8],
        sealing: Sealing<'_>,
    ) -> Result<(), ClientError> {
        self.ensure_usable()?;
        let nonce = Nonce::new(
            self.session.cookie,
            self.session.address,
            Address::SERVER,
            self.session.csn,
        );
        let frame = envelope::pack_raw(&nonce, payload, self.resolve(sealing))?;
        self.session.csn = self.session.csn.next()?;

        debug!(csn = %nonce.csn, len = frame.len(), "sending to relay");
        self.transport.send(frame).await
    }

    /// Receive and decode the next relay message.
    pub async fn recv(&mut self, sealing: Sealing<'_>) -> Result<Envelope, ClientError> {
        let (nonce, raw_nonce, payload) = self.recv_frame(sealing).await?;
        let message = Message::from_msgpack(&payload).map_err(|e| self.poison(e))?;
        Ok(Envelope {
            message,
            nonce,
            raw_nonce,
        })
    }

    /// Receive the next relay payload without decoding it.
    pub async fn recv_raw(
        &mut self,
        sealing: Sealing<'_>,
    ) -> Result<(Nonce, Vec<u8>), ClientError> {
        let (nonce, _, payload) = self.recv_frame(sealing).await?;
        Ok((nonce, payload))
    }

    /// Close the underlying transport.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.transport.close().await
    }

    pub fn into_parts(self) -> (T, Established) {
        (self.transport, self.session)
    }

    async fn recv_frame(
        &mut self,
        sealing: Sealing<'_>,
    ) -> Result<(Nonce, [u8; NONCE_LENGTH], Vec<u8>), ClientError> {
        self.ensure_usable()?;
        let frame = with_timeout(self.timeout, "relay message", self.transport.recv())
            .await
            .map_err(|e| {
                // Timeouts are fatal too.
                if e.is_timeout() {
                    self.poisoned = true;
                }
                e
            })?;

        let unpacked = envelope::unpack_raw(&frame, self.resolve(sealing));
        let (nonce, raw_nonce, payload) = unpacked.map_err(|e| self.poison(e))?;
        self.check_incoming(&nonce).map_err(|e| self.poison(e))?;
        self.session.server_csn = nonce.csn;
        Ok((nonce, raw_nonce, payload))
    }

    fn resolve<'s>(&'s self, sealing: Sealing<'s>) -> Option<&'s SharedBox> {
        match sealing {
            Sealing::Session => Some(&self.session.session_box),
            Sealing::With(shared) => Some(shared),
            Sealing::Plain => None,
        }
    }

    fn check_incoming(&self, nonce: &Nonce) -> Result<(), ProtocolError> {
        if !nonce.source.is_server() {
            return Err(ProtocolError::InvalidAddress {
                field: "relay message source",
                actual: nonce.source,
            });
        }
        if nonce.destination != self.session.address {
            return Err(ProtocolError::InvalidAddress {
                field: "relay message destination",
                actual: nonce.destination,
            });
        }
        if !constant_time_eq(nonce.cookie.as_bytes(), self.session.server_cookie.as_bytes()) {
            return Err(ProtocolError::CookieMismatch(format!(
                "relay cookie changed to {}",
                nonce.cookie.to_hex()
            )));
        }
        let expected = self.session.server_csn.next()?;
        if nonce.csn != expected {
            return Err(ProtocolError::SequenceViolation(format!(
                "relay csn {} but expected {}",
                nonce.csn, expected
            )));
        }
        Ok(())
    }

    fn ensure_usable(&self) -> Result<(), ClientError> {
        if self.poisoned {
            return Err(ProtocolError::InvalidState("signaling channel has failed").into());
        }
        Ok(())
    }

    fn poison(&mut self, err: ProtocolError) -> ClientError {
        warn!(error = %err, "relay violated the protocol");
        self.poisoned = true;
        err.into()
    }
}
