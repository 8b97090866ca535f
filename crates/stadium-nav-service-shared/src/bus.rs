//! MQTT bridge feeding the event listener.
//!
//! The bridge subscribes to the configured topics (re-subscribing after
//! every reconnect) and forwards each publish as a [`BusMessage`]. It never
//! interprets payloads.
//!
//! # Environment Variables
//!
//! - `MQTT_HOST`: broker host; the bridge is disabled when unset
//! - `MQTT_PORT`: broker port (default: 1883)
//! - `MQTT_CLIENT_ID`: client id (default: `stadium-nav-<uuid>`)
//! - `MQTT_TOPICS`: comma-separated subscriptions (default: crowd, hazard,
//!   emergency and general event topics)

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::listener::BusMessage;

pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_TOPICS: &[&str] = &[
    "stadium/events",
    "stadium/crowd/#",
    "stadium/hazards/#",
    "stadium/emergency/#",
];

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topics: Vec<String>,
    pub keep_alive: Duration,
}

impl MqttConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_MQTT_PORT,
            client_id: format!("stadium-nav-{}", uuid::Uuid::now_v7().simple()),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            keep_alive: Duration::from_secs(30),
        }
    }

    /// `None` when `MQTT_HOST` is unset or empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let host = lookup("MQTT_HOST").filter(|host| !host.trim().is_empty())?;
        let mut config = Self::new(host.trim());

        if let Some(port) = lookup("MQTT_PORT").and_then(|port| port.trim().parse().ok()) {
            config.port = port;
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID").filter(|id| !id.trim().is_empty()) {
            config.client_id = client_id;
        }
        if let Some(topics) = lookup("MQTT_TOPICS") {
            let topics: Vec<String> = topics
                .split(',')
                .map(str::trim)
                .filter(|topic| !topic.is_empty())
                .map(String::from)
                .collect();
            if !topics.is_empty() {
                config.topics = topics;
            }
        }
        Some(config)
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options
    }
}

/// Spawn the bridge task. It stops once the receiving side is closed.
pub fn spawn_mqtt_bridge(config: MqttConfig, sender: mpsc::Sender<BusMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (client, mut eventloop) = AsyncClient::new(config.options(), 64);
        tracing::info!(
            host = %config.host,
            port = config.port,
            topics = ?config.topics,
            "connecting to message bus"
        );

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("message bus connected");
                    for topic in &config.topics {
                        if let Err(err) = client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                            tracing::warn!(topic = %topic, error = %err, "subscribe failed");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = BusMessage::new(publish.topic.clone(), publish.payload.to_vec());
                    if sender.send(message).await.is_err() {
                        tracing::info!("event listener closed, stopping message bus bridge");
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "message bus connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    })
}
