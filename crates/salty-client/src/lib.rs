//! Relay client: transports, the async handshake driver and the signaling
//! channel that remains once the handshake is done.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use salty_client::Connector;
//! use salty_crypto::{KeyPair, Role};
//!
//! # async fn run() -> Result<(), salty_client::ClientError> {
//! let key = Arc::new(KeyPair::generate());
//! let channel = Connector::new(Role::Responder, key)
//!     .connect("wss://127.0.0.1:8765")
//!     .await?;
//! println!("assigned {}", channel.address());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod helpers;
pub mod signaling;
pub mod transport;
pub mod ws;

pub use client::Connector;
pub use error::ClientError;
pub use helpers::negotiate_subprotocol;
pub use signaling::{Sealing, SignalingChannel};
pub use transport::{MemoryTransport, Transport};
pub use ws::{relay_url, WsTransport};
