//! WebSocket transport to a relay.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use salty_core::ProtocolError;

use crate::error::ClientError;
use crate::transport::Transport;

/// Build the relay endpoint: `<base>/<hex public key>`.
pub fn relay_url(base: &str, public_key_hex: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(base)
        .map_err(|e| salty_common::Error::config(format!("invalid relay url {base:?}: {e}")))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(salty_common::Error::config(format!(
            "relay url must use ws:// or wss://, got {}://",
            url.scheme()
        ))
        .into());
    }
    let path = format!("{}/{}", url.path().trim_end_matches('/'), public_key_hex);
    url.set_path(&path);
    Ok(url)
}

/// Binary-frame WebSocket connection to a relay.
pub struct WsTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    subprotocol: Option<String>,
}

impl WsTransport {
    /// Connect to `url`, offering `subprotocols` in order of preference.
    pub async fn connect(url: &Url, subprotocols: &[String]) -> Result<Self, ClientError> {
        let mut request = url.as_str().into_client_request()?;
        let offered = HeaderValue::from_str(&subprotocols.join(", "))
            .map_err(|e| ClientError::transport(format!("invalid subprotocol list: {e}")))?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, offered);

        let (ws, response) = connect_async(request).await?;
        let subprotocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match &subprotocol {
            Some(chosen) => debug!(url = %url, subprotocol = %chosen, "connected to relay"),
            None => warn!(url = %url, "relay did not confirm a subprotocol"),
        }

        Ok(Self { ws, subprotocol })
    }

    /// Sub-protocol the relay selected during the upgrade.
    pub fn subprotocol(&self) -> Option<&str> {
        self.subprotocol.as_deref()
    }
}

impl Transport for WsTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), ClientError> {
        self.ws.send(WsMessage::Binary(frame.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, ClientError> {
        while let Some(msg) = self.ws.next().await {
            match msg? {
                WsMessage::Binary(data) => return Ok(data.to_vec()),
                WsMessage::Text(_) => {
                    return Err(ProtocolError::malformed("text frame on a binary channel").into())
                }
                WsMessage::Close(frame) => {
                    debug!(?frame, "relay closed the connection");
                    return Err(ClientError::ConnectionClosed);
                }
                _ => continue,
            }
        }
        Err(ClientError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        match self.ws.close(None).await {
            Ok(()) => Ok(()),
            Err(e) => match ClientError::from(e) {
                ClientError::ConnectionClosed => Ok(()),
                other => Err(other),
            },
        }
    }
}
