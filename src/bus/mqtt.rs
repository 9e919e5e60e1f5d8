//! # MQTT transport adapter (feature `mqtt`).
//!
//! [`MqttBus`] implements [`BusClient`] over `rumqttc`. One connection per
//! operation: the handshake waits for `ConnAck` under the connect timeout,
//! subscriptions go out at QoS 0, and the message stream is the event loop
//! filtered down to `Publish` packets.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::bus::client::{BusClient, BusConnection, Message};
use crate::error::LensError;

/// Broker addressing for MQTT connections.
#[derive(Clone, Debug)]
pub struct MqttBus {
    /// Broker hostname or IP.
    pub host: String,
    /// Broker port (typically 1883).
    pub port: u16,
    /// Client identifier prefix; a per-connection suffix is appended.
    pub client_id: String,
}

impl MqttBus {
    /// Creates an adapter for the given broker address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: "topiclens".to_string(),
        }
    }
}

#[async_trait]
impl BusClient for MqttBus {
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn BusConnection>, LensError> {
        let id = format!("{}-{}", self.client_id, std::process::id());
        let mut opts = MqttOptions::new(id, self.host.clone(), self.port);
        opts.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(opts, 64);

        // The connection is only usable once the broker acknowledges it.
        let handshake = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                    Ok(_) => continue,
                    Err(e) => return Err(e.to_string()),
                }
            }
        };

        match tokio::time::timeout(timeout, handshake).await {
            Ok(Ok(())) => Ok(Box::new(MqttConnection { client, eventloop })),
            Ok(Err(reason)) => Err(LensError::Connect { reason }),
            Err(_elapsed) => Err(LensError::Connect {
                reason: format!("no broker acknowledgement within {timeout:?}"),
            }),
        }
    }
}

struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
}

#[async_trait]
impl BusConnection for MqttConnection {
    async fn subscribe(&mut self, pattern: &str) -> Result<(), LensError> {
        self.client
            .subscribe(pattern, QoS::AtMostOnce)
            .await
            .map_err(|e| LensError::Subscribe {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    async fn next_message(&mut self) -> Option<Message> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Some(Message::new(publish.topic, publish.payload.to_vec()));
                }
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    async fn close(self: Box<Self>) {
        // Best-effort: an unreachable broker must not hang the caller.
        let _ = tokio::time::timeout(Duration::from_secs(2), self.client.disconnect()).await;
    }
}
