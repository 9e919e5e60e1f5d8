//! # In-memory bus.
//!
//! [`MemoryBus`] is a broker-like hub over [`tokio::sync::broadcast`]: every
//! published message is fanned out to all open connections, and each
//! connection filters by its own subscription patterns with MQTT-style
//! matching (`#` for any remaining levels, `+` for exactly one level).
//!
//! It exists for tests and embedded demos; production transports implement
//! [`BusClient`] over a real broker (see the `mqtt` feature).
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use topiclens::{BusClient, MemoryBus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = MemoryBus::new(64);
//!     let mut conn = bus.connect(Duration::from_secs(1)).await.unwrap();
//!     conn.subscribe("home/+/temperature").await.unwrap();
//!
//!     bus.publish("home/kitchen/temperature", b"21.5");
//!     let msg = conn.next_message().await.unwrap();
//!     assert_eq!(msg.topic, "home/kitchen/temperature");
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::bus::client::{BusClient, BusConnection, Message};
use crate::error::LensError;

/// Broadcast hub shared by all in-memory connections.
#[derive(Clone)]
pub struct MemoryBus {
    tx: broadcast::Sender<Message>,
}

impl MemoryBus {
    /// Creates a new hub with the given per-connection buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes a message to every open connection.
    ///
    /// Errors are ignored if no connection is open.
    pub fn publish(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        let _ = self.tx.send(Message::new(topic, payload));
    }
}

#[async_trait]
impl BusClient for MemoryBus {
    async fn connect(&self, _timeout: Duration) -> Result<Box<dyn BusConnection>, LensError> {
        Ok(Box::new(MemoryConnection {
            rx: self.tx.subscribe(),
            patterns: Vec::new(),
        }))
    }
}

struct MemoryConnection {
    rx: broadcast::Receiver<Message>,
    patterns: Vec<String>,
}

#[async_trait]
impl BusConnection for MemoryConnection {
    async fn subscribe(&mut self, pattern: &str) -> Result<(), LensError> {
        self.patterns.push(pattern.to_string());
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Message> {
        loop {
            match self.rx.recv().await {
                Ok(msg) => {
                    if self.patterns.iter().any(|p| pattern_matches(p, &msg.topic)) {
                        return Some(msg);
                    }
                }
                // Dropped messages under backpressure; keep consuming.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn close(self: Box<Self>) {}
}

/// MQTT-style pattern match: `#` matches any remaining levels (including
/// none), `+` matches exactly one level.
fn pattern_matches(pattern: &str, topic: &str) -> bool {
    let mut pat = pattern.split('/');
    let mut top = topic.split('/');

    loop {
        match (pat.next(), top.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(p), Some(t)) if p == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}
