//! Event ingestor: one MQTT subscription feeding the command queue.
//!
//! The handler only parses and enqueues. It never opens the store and never
//! does blocking I/O, so a slow flush can't back up the subscription.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::AppResult;
use crate::models::ScanEvent;
use crate::queue::CommandQueue;

/// Parse one broker message and append its commands to the queue.
/// Malformed payloads are logged and dropped; this function never fails.
pub fn handle_message(payload: &[u8], queue: &CommandQueue) {
    match ScanEvent::parse(payload) {
        Ok(event) => {
            debug!(token = event.token(), "queuing commands");
            queue.extend(event.into_commands());
        }
        Err(e) => {
            warn!(error = %e, "discarding unparsable message");
        }
    }
}

/// Connect to the broker, subscribe to the scan topic and pump the event
/// loop until the task is cancelled. Connection drops are logged and the
/// loop keeps polling; rumqttc reconnects and re-delivers the subscription.
pub async fn run_ingestor(cfg: &Config, queue: CommandQueue) -> AppResult<()> {
    let mut options = MqttOptions::new(&cfg.client_id, &cfg.broker_host, cfg.broker_port);
    options.set_keep_alive(Duration::from_secs(cfg.keep_alive_secs));
    options.set_clean_session(false);

    let (client, mut eventloop) = AsyncClient::new(options, 64);
    client.subscribe(&cfg.topic, QoS::AtLeastOnce).await?;
    info!(topic = %cfg.topic, host = %cfg.broker_host, "subscribed to scan topic");

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_message(&publish.payload, &queue);
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                // Re-subscribe after a reconnect; the broker may have
                // dropped the session state.
                client.subscribe(&cfg.topic, QoS::AtLeastOnce).await?;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "MQTT connection error, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
