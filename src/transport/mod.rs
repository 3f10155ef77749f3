//! Session transport
//!
//! Flows talk to counterparties over point-to-point sessions. A session only
//! moves byte frames; [`message::FlowMessage`] gives those frames meaning.
//!
//! - [`memory`]: in-process channel pairs, used by the demo and the tests
//!
//! Real network transports are out of scope for this crate; anything that
//! implements [`Transport`] can carry a session.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod message;

pub use message::FlowMessage;

/// Transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection closed
    #[error("Connection closed")]
    Disconnected,

    /// Send failed
    #[error("Failed to send: {0}")]
    SendFailed(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Moves byte frames between two endpoints of a session
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame to the peer
    async fn send(&mut self, data: &[u8]) -> TransportResult<()>;

    /// Receive the next frame.
    ///
    /// Waits until a frame arrives or the peer goes away.
    async fn receive(&mut self) -> TransportResult<Vec<u8>>;

    /// Check if the transport is connected
    fn is_connected(&self) -> bool;

    /// Close the transport
    async fn close(&mut self) -> TransportResult<()>;
}
