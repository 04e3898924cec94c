use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::BusMessage;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("bus publish failed: {0}")]
    Publish(String),
    #[error("bus subscribe failed: {0}")]
    Subscribe(String),
}

/// Publishing half of the bus contract. Implementations must preserve relative publish order
/// for messages sharing the same `(topic, key)` pair.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, message: BusMessage) -> Result<(), BusError>;

    async fn publish_all(&self, messages: Vec<BusMessage>) -> Result<(), BusError> {
        for message in messages {
            self.publish(message).await?;
        }
        Ok(())
    }
}

/// Consuming half of the bus contract. A handle returned by `subscribe` yields messages for
/// one topic in publish order.
#[async_trait]
pub trait BusConsumer: Send + Sync {
    type Handle: BusSubscription;

    async fn subscribe(&self, topic: &str) -> Result<Self::Handle, BusError>;
}

#[async_trait]
pub trait BusSubscription: Send {
    async fn recv(&mut self) -> Option<BusMessage>;
}
