use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use super::BrokerClient;
use crate::utils::error::ClientError;

/// `BrokerClient` over a `rumqttc` connection. Requests are queued to the
/// event loop driven by the transport pump.
#[derive(Debug, Clone)]
pub struct MqttClient {
    inner: AsyncClient,
}

impl MqttClient {
    pub fn new(inner: AsyncClient) -> Self {
        Self { inner }
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.inner.disconnect().await?;
        Ok(())
    }
}

impl BrokerClient for MqttClient {
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), ClientError>> + Send {
        let topic = topic.to_string();
        async move {
            self.inner.subscribe(topic, QoS::AtMostOnce).await?;
            Ok(())
        }
    }

    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        let topic = topic.to_string();
        let payload = payload.to_vec();
        async move {
            self.inner
                .publish(topic, QoS::AtMostOnce, false, payload)
                .await?;
            Ok(())
        }
    }
}
