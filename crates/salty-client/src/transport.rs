//! Frame transport contract.
//!
//! The handshake only needs to move whole binary frames; how they travel is
//! up to the implementation. [`MemoryTransport`] connects two ends in-process
//! and is what the tests use in place of a relay socket.

use std::future::Future;
use tokio::sync::mpsc;

use crate::error::ClientError;

/// A message-framed, ordered, bidirectional byte transport.
pub trait Transport: Send {
    /// Send one frame.
    fn send(&mut self, frame: Vec<u8>) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Wait for the next frame. Callers bound this with a timeout.
    fn recv(&mut self) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    /// Close the transport. Further sends fail.
    fn close(&mut self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// In-process transport backed by unbounded channels.
#[derive(Debug)]
pub struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryTransport {
    /// Two connected ends: what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(a_tx),
                rx: b_rx,
            },
            Self {
                tx: Some(b_tx),
                rx: a_rx,
            },
        )
    }
}

impl Transport for MemoryTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), ClientError> {
        let tx = self.tx.as_ref().ok_or(ClientError::ConnectionClosed)?;
        tx.send(frame).map_err(|_| ClientError::ConnectionClosed)
    }

    async fn recv(&mut self) -> Result<Vec<u8>, ClientError> {
        self.rx.recv().await.ok_or(ClientError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.send(vec![1]).await.unwrap();
        a.send(vec![2, 3]).await.unwrap();

        assert_eq!(b.recv().await.unwrap(), vec![1]);
        assert_eq!(b.recv().await.unwrap(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_close_is_seen_by_peer() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.close().await.unwrap();

        assert!(matches!(a.send(vec![0]).await, Err(ClientError::ConnectionClosed)));
        assert!(matches!(b.recv().await, Err(ClientError::ConnectionClosed)));
    }
}
