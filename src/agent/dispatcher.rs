//! Connection event dispatcher
//!
//! `UpdateAgent` owns everything the broker callbacks used to share: the
//! topic names, the intent store, the version gate and the connectivity
//! flag. Events arrive one at a time from the transport queue, so there is a
//! single point of mutation and no locking.

use std::future::Future;

use tokio::sync::{mpsc, watch};

use super::reboot::{RebootController, Restart};
use crate::broker::{BrokerEvent, InboundMessage, TopicSet};
use crate::client::BrokerClient;
use crate::command::{self, Command};
use crate::persistence::IntentStore;
use crate::update::{GateDecision, VersionGate};
use crate::utils::error::AgentError;

pub const UPDATE_REBOOT_REASON: &str = "Update flag configured. Restarting...";

/// What the event loop should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Reboot(String),
}

pub struct UpdateAgent<C> {
    client: C,
    topics: TopicSet,
    store: IntentStore,
    gate: VersionGate,
    running_version: String,
    connected: watch::Sender<bool>,
}

impl<C: BrokerClient> UpdateAgent<C> {
    pub fn init(
        client: C,
        topics: TopicSet,
        store: IntentStore,
        gate: VersionGate,
        running_version: impl Into<String>,
    ) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            client,
            topics,
            store,
            gate,
            running_version: running_version.into(),
            connected,
        }
    }

    /// Broker reachability, for anyone who needs to watch it.
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub async fn handle_event(&mut self, event: BrokerEvent) -> Result<Dispatch, AgentError> {
        match event {
            BrokerEvent::Connected => {
                tracing::info!("mqtt connected");
                self.connected.send_replace(true);
                for topic in [&self.topics.update, &self.topics.setid] {
                    if let Err(e) = self.client.subscribe(topic).await {
                        tracing::error!(%topic, error = %e, "subscribe failed");
                    }
                }
                Ok(Dispatch::Continue)
            }
            BrokerEvent::Disconnected => {
                tracing::info!("mqtt disconnected");
                self.connected.send_replace(false);
                Ok(Dispatch::Continue)
            }
            BrokerEvent::Data(msg) => self.handle_data(msg).await,
            BrokerEvent::BeforeConnect => {
                tracing::debug!("mqtt connecting");
                Ok(Dispatch::Continue)
            }
            BrokerEvent::Subscribed { pkid } => {
                tracing::debug!(pkid, "mqtt subscribed");
                Ok(Dispatch::Continue)
            }
            BrokerEvent::Unsubscribed { pkid } => {
                tracing::debug!(pkid, "mqtt unsubscribed");
                Ok(Dispatch::Continue)
            }
            BrokerEvent::Published { pkid } => {
                tracing::debug!(pkid, "mqtt published");
                Ok(Dispatch::Continue)
            }
        }
    }

    async fn handle_data(&mut self, msg: InboundMessage) -> Result<Dispatch, AgentError> {
        tracing::info!(
            topic = %msg.topic,
            len = msg.payload.len(),
            payload = %String::from_utf8_lossy(&msg.payload),
            "incoming data"
        );

        match command::parse(&self.topics, &msg) {
            Command::NoOp => Ok(Dispatch::Continue),
            Command::Query => {
                self.client
                    .publish(&self.topics.version, self.running_version.as_bytes())
                    .await?;
                Ok(Dispatch::Continue)
            }
            Command::Update(intent) => match self.gate.decide(&self.running_version, intent) {
                GateDecision::Reject(reason) => {
                    tracing::info!(?reason, running = %self.running_version, "update rejected");
                    Ok(Dispatch::Continue)
                }
                GateDecision::Accept(intent) => {
                    self.store
                        .write_pending(&intent.candidate_version, intent.expected_size)?;
                    Ok(Dispatch::Reboot(UPDATE_REBOOT_REASON.to_string()))
                }
            },
        }
    }

    /// Consumes events until the queue closes or `shutdown` resolves.
    ///
    /// An accepted update ends in `reboot`, which does not return.
    pub async fn run<R, S>(
        mut self,
        events: &mut mpsc::Receiver<BrokerEvent>,
        reboot: &RebootController<R>,
        shutdown: S,
    ) -> Result<(), AgentError>
    where
        R: Restart,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("broker event queue closed");
                        break;
                    };
                    match self.handle_event(event).await {
                        Ok(Dispatch::Continue) => {}
                        Ok(Dispatch::Reboot(reason)) => {
                            self.store.flush()?;
                            reboot.reboot(&reason);
                        }
                        Err(e) => tracing::error!(error = %e, "event handling failed"),
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        self.shutdown()
    }

    /// Flushes storage and drops the agent.
    pub fn shutdown(self) -> Result<(), AgentError> {
        self.connected.send_replace(false);
        self.store.flush()?;
        tracing::info!("update agent stopped");
        Ok(())
    }
}
