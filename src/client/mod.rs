//! The `client` module is the seam between the agent and the broker
//! connection: the two operations the agent performs on the broker.

pub mod mqtt_client;

use std::future::Future;

use crate::utils::error::ClientError;

pub use mqtt_client::MqttClient;

pub trait BrokerClient {
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
