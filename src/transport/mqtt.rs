//! MQTT transport
//!
//! `rumqttc` drives the connection from an `EventLoop` that must be polled.
//! The pump polls it in its own task and forwards every event the agent
//! cares about into a bounded channel, so all agent state is mutated from
//! one place. Reconnection is left to `rumqttc`: polling again after an
//! error starts a new connection attempt.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, Transport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broker::{BrokerEvent, InboundMessage};
use crate::client::MqttClient;
use crate::config::MqttSettings;
use crate::utils::error::AgentError;

/// Pause between a connection error and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

const MIN_KEEP_ALIVE_SECS: u64 = 5;

pub fn mqtt_options(settings: &MqttSettings, client_id: &str) -> Result<MqttOptions, AgentError> {
    let mut options = MqttOptions::new(client_id, settings.host.clone(), settings.port);
    options.set_keep_alive(Duration::from_secs(
        settings.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
    ));

    if let Some(username) = &settings.username {
        options.set_credentials(username.clone(), settings.password.clone().unwrap_or_default());
    }

    if let Some(ca_path) = &settings.ca_cert_path {
        let ca = std::fs::read(ca_path)?;
        options.set_transport(Transport::tls(ca, None, None));
    }

    Ok(options)
}

/// Opens the connection and starts the pump.
pub fn connect(
    settings: &MqttSettings,
    client_id: &str,
) -> Result<(MqttClient, mpsc::Receiver<BrokerEvent>, JoinHandle<()>), AgentError> {
    let options = mqtt_options(settings, client_id)?;
    let (client, eventloop) = AsyncClient::new(options, settings.event_capacity);
    let (tx, rx) = mpsc::channel(settings.event_capacity);

    tracing::info!(host = %settings.host, port = settings.port, "connecting to mqtt broker");
    let pump = tokio::spawn(run_pump(eventloop, tx, RECONNECT_DELAY));

    Ok((MqttClient::new(client), rx, pump))
}

/// Maps a `rumqttc` event to the agent's vocabulary.
pub fn translate(event: &Event) -> Option<BrokerEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Some(BrokerEvent::Connected),
        Event::Incoming(Packet::Disconnect) => Some(BrokerEvent::Disconnected),
        Event::Incoming(Packet::SubAck(ack)) => Some(BrokerEvent::Subscribed { pkid: ack.pkid }),
        Event::Incoming(Packet::UnsubAck(ack)) => {
            Some(BrokerEvent::Unsubscribed { pkid: ack.pkid })
        }
        Event::Incoming(Packet::PubAck(ack)) => Some(BrokerEvent::Published { pkid: ack.pkid }),
        Event::Incoming(Packet::Publish(publish)) => Some(BrokerEvent::Data(InboundMessage::new(
            publish.topic.clone(),
            publish.payload.to_vec(),
        ))),
        Event::Outgoing(Outgoing::Publish(pkid)) => Some(BrokerEvent::Published { pkid: *pkid }),
        _ => None,
    }
}

/// Polls the event loop until the receiving side goes away.
pub async fn run_pump(
    mut eventloop: EventLoop,
    tx: mpsc::Sender<BrokerEvent>,
    reconnect_delay: Duration,
) {
    let mut connected = false;
    if tx.send(BrokerEvent::BeforeConnect).await.is_err() {
        return;
    }

    loop {
        let next = match eventloop.poll().await {
            Ok(event) => match translate(&event) {
                Some(BrokerEvent::Connected) => {
                    connected = true;
                    BrokerEvent::Connected
                }
                Some(BrokerEvent::Disconnected) => {
                    connected = false;
                    BrokerEvent::Disconnected
                }
                Some(other) => other,
                None => continue,
            },
            Err(e) => {
                tracing::warn!(error = %e, "mqtt connection error");
                if connected {
                    connected = false;
                    if tx.send(BrokerEvent::Disconnected).await.is_err() {
                        break;
                    }
                }
                tokio::time::sleep(reconnect_delay).await;
                BrokerEvent::BeforeConnect
            }
        };

        if tx.send(next).await.is_err() {
            break;
        }
    }

    tracing::debug!("mqtt pump stopped");
}
