//! # Core transport traits.
//!
//! `BusClient`/`BusConnection` are the seam between topiclens operations and
//! the actual pub/sub transport. The collector and recorder only ever:
//!
//! 1. open **one** connection per operation (with a connect timeout),
//! 2. issue subscriptions on it,
//! 3. consume its message stream until done or cancelled,
//! 4. close it promptly.
//!
//! The stream is lazy, potentially infinite, and non-restartable: once
//! `next_message` returns `None` the connection is spent.
//!
//! ## Contract
//! - `connect` must fail with [`LensError::Connect`] when the broker is
//!   unreachable or the handshake does not complete within `timeout`.
//! - `next_message` blocks until the next message arrives or the connection
//!   dies; callers race it against their own deadline.
//! - `close` must release broker-side subscriptions promptly so the bus does
//!   not hold them open after the caller has moved on.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LensError;

/// One message received from the bus.
#[derive(Clone, Debug)]
pub struct Message {
    /// Hierarchical topic name (`/`-separated segments).
    pub topic: String,
    /// Raw payload bytes, decoded later by the payload codec.
    pub payload: Vec<u8>,
}

impl Message {
    /// Creates a message from a topic and payload.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Factory for bus connections.
///
/// Implementations carry broker addressing/credentials; the operations only
/// ask for a connection with a handshake timeout.
#[async_trait]
pub trait BusClient: Send + Sync + 'static {
    /// Opens one connection to the bus.
    ///
    /// # Errors
    /// Returns [`LensError::Connect`] when the broker is unreachable or the
    /// handshake exceeds `timeout`.
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn BusConnection>, LensError>;
}

/// A live subscription-capable connection.
#[async_trait]
pub trait BusConnection: Send {
    /// Subscribes to a topic pattern (exact topic, `#`, or a subtree).
    ///
    /// # Errors
    /// Returns [`LensError::Subscribe`] when the subscription cannot be
    /// issued on this connection.
    async fn subscribe(&mut self, pattern: &str) -> Result<(), LensError>;

    /// Waits for the next message matching any active subscription.
    ///
    /// Returns `None` when the connection is closed or lost; the stream
    /// cannot be restarted.
    async fn next_message(&mut self) -> Option<Message>;

    /// Closes the connection and releases its subscriptions.
    async fn close(self: Box<Self>);
}
