//! Async handshake driver.

use std::sync::Arc;
use std::time::Duration;

use salty_common::config::DEFAULT_TIMEOUT_MS;
use salty_common::ClientConfig;
use salty_crypto::{ClientHandshake, Established, HandshakeParams, KeyPair, Role};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::helpers::{negotiate_subprotocol, with_timeout};
use crate::signaling::SignalingChannel;
use crate::transport::Transport;
use crate::ws::{relay_url, WsTransport};

/// Runs the handshake for one role and identity over any [`Transport`].
///
/// Each call to [`Connector::handshake`] is an independent attempt with its
/// own cookie and session state.
#[derive(Debug, Clone)]
pub struct Connector {
    role: Role,
    permanent: Arc<KeyPair>,
    params: HandshakeParams,
    timeout: Duration,
}

impl Connector {
    pub fn new(role: Role, permanent: Arc<KeyPair>) -> Self {
        Self {
            role,
            permanent,
            params: HandshakeParams::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn from_config(
        role: Role,
        permanent: Arc<KeyPair>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let params = HandshakeParams {
            cookie: None,
            initial_csn: config.initial_csn,
            subprotocols: config.subprotocols.clone(),
            ping_interval: config.ping_interval,
            server_permanent_key: config.server_permanent_key_bytes()?,
            explicit_permanent_key: config.explicit_permanent_key,
        };
        Ok(Self::new(role, permanent)
            .with_params(params)
            .with_timeout(config.timeout()))
    }

    pub fn with_params(mut self, params: HandshakeParams) -> Self {
        self.params = params;
        self
    }

    /// Bound on every individual receive.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn params(&self) -> &HandshakeParams {
        &self.params
    }

    /// Open a WebSocket to `<base_url>/<hex public key>` and run the handshake.
    pub async fn connect(
        &self,
        base_url: &str,
    ) -> Result<SignalingChannel<WsTransport>, ClientError> {
        let url = relay_url(base_url, &self.permanent.public_key_hex())?;
        let mut transport = with_timeout(
            self.timeout,
            "websocket upgrade",
            WsTransport::connect(&url, &self.params.subprotocols),
        )
        .await?;

        if let Some(chosen) = transport.subprotocol() {
            if negotiate_subprotocol(&self.params.subprotocols, &[chosen.to_string()]).is_none() {
                let err =
                    ClientError::transport(format!("relay chose unoffered subprotocol {chosen}"));
                let _ = transport.close().await;
                return Err(err);
            }
        }

        self.handshake(transport).await
    }

    /// Run the handshake over an already connected transport.
    ///
    /// On failure the transport is closed and all key material of the
    /// attempt is dropped.
    pub async fn handshake<T: Transport>(
        &self,
        mut transport: T,
    ) -> Result<SignalingChannel<T>, ClientError> {
        let mut handshake =
            ClientHandshake::new(self.role, self.permanent.clone(), self.params.clone())?;

        match self.drive(&mut handshake, &mut transport).await {
            Ok(established) => {
                info!(
                    role = self.role.as_str(),
                    address = %established.address,
                    verified = established.signed_keys_verified,
                    "signaling session established"
                );
                Ok(SignalingChannel::new(transport, established, self.timeout))
            }
            Err(e) => {
                if let ClientError::Protocol(err) = &e {
                    if err.is_security_event() {
                        warn!(
                            role = self.role.as_str(),
                            error = %err,
                            "possible tampering by relay"
                        );
                    }
                }
                handshake.abort();
                if let Err(close_err) = transport.close().await {
                    debug!(error = %close_err, "closing transport after failed handshake");
                }
                Err(e)
            }
        }
    }

    async fn drive<T: Transport>(
        &self,
        handshake: &mut ClientHandshake,
        transport: &mut T,
    ) -> Result<Established, ClientError> {
        let frame = with_timeout(self.timeout, "server-hello", transport.recv()).await?;
        handshake.handle_server_hello(&frame)?;

        while let Some(frame) = handshake.next_frame()? {
            transport.send(frame).await?;
        }

        let frame = with_timeout(self.timeout, "server-auth", transport.recv()).await?;
        Ok(handshake.handle_server_auth(&frame)?)
    }
}
