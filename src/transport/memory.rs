//! In-memory transport
//!
//! Uses channels to simulate a connection between two endpoints.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Transport, TransportError, TransportResult};

/// Frames buffered per direction before `send` waits
const CHANNEL_CAPACITY: usize = 64;

/// Create a pair of connected in-memory transports
pub fn create_pair() -> (MemoryTransport, MemoryTransport) {
    let (tx1, rx1) = mpsc::channel(CHANNEL_CAPACITY);
    let (tx2, rx2) = mpsc::channel(CHANNEL_CAPACITY);

    let first = MemoryTransport {
        tx: tx1,
        rx: rx2,
        connected: true,
    };

    let second = MemoryTransport {
        tx: tx2,
        rx: rx1,
        connected: true,
    };

    (first, second)
}

/// In-memory transport endpoint
pub struct MemoryTransport {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
    connected: bool,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        self.tx
            .send(data.to_vec())
            .await
            .map_err(|_| TransportError::SendFailed("Channel closed".to_string()))
    }

    async fn receive(&mut self) -> TransportResult<Vec<u8>> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        self.rx.recv().await.ok_or(TransportError::Disconnected)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.connected = false;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport() {
        let (mut wallet, mut bank) = create_pair();

        wallet.send(b"proposal").await.unwrap();
        assert_eq!(bank.receive().await.unwrap(), b"proposal");

        bank.send(b"signature").await.unwrap();
        assert_eq!(wallet.receive().await.unwrap(), b"signature");
    }

    #[tokio::test]
    async fn test_memory_transport_close() {
        let (mut wallet, mut bank) = create_pair();

        wallet.close().await.unwrap();
        assert!(!wallet.is_connected());
        assert!(wallet.send(b"late").await.is_err());

        // the peer sees a dropped endpoint as a disconnect
        drop(wallet);
        assert_eq!(bank.receive().await, Err(TransportError::Disconnected));
    }
}
