//! Transport seam: pub/sub client traits and bundled implementations.

mod client;
mod memory;

#[cfg(feature = "mqtt")]
mod mqtt;

pub use client::{BusClient, BusConnection, Message};
pub use memory::MemoryBus;

#[cfg(feature = "mqtt")]
pub use mqtt::MqttBus;
