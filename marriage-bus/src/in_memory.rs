use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::client::{BusConsumer, BusError, BusPublisher, BusSubscription};
use crate::envelope::BusMessage;

const CHANNEL_CAPACITY: usize = 1024;

/// Single-process bus used by the service binary's in-process consumers and by integration
/// tests: a struct wrapping a map of `tokio::sync::broadcast` senders, one per topic.
/// Dynamically keyed rather than one fixed field per event type, since the domain here
/// publishes to a handful of env-configurable topic names rather than a fixed compile-time set.
pub struct InMemoryBus {
    topics: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    fn sender_for(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        if let Some(sender) = self.topics.read().unwrap().get(topic) {
            return sender.clone();
        }
        let mut topics = self.topics.write().unwrap();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusPublisher for InMemoryBus {
    async fn publish(&self, message: BusMessage) -> Result<(), BusError> {
        let sender = self.sender_for(&message.topic);
        // No active subscriber is not an error: commands/events may be published before the
        // sweeper or consumer that cares has subscribed, or after the last one has shut down.
        let _ = sender.send(message);
        Ok(())
    }
}

pub struct InMemorySubscription {
    receiver: broadcast::Receiver<BusMessage>,
}

#[async_trait]
impl BusSubscription for InMemorySubscription {
    async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus subscriber lagged, messages dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
impl BusConsumer for InMemoryBus {
    type Handle = InMemorySubscription;

    async fn subscribe(&self, topic: &str) -> Result<Self::Handle, BusError> {
        let sender = self.sender_for(topic);
        Ok(InMemorySubscription {
            receiver: sender.subscribe(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_then_subscribe_delivers_in_order() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("marriage.status").await.unwrap();

        bus.publish(BusMessage::new("marriage.status", "1", json!({"seq": 1})))
            .await
            .unwrap();
        bus.publish(BusMessage::new("marriage.status", "1", json!({"seq": 2})))
            .await
            .unwrap();

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_eq!(first.body["seq"], 1);
        assert_eq!(second.body["seq"], 2);
    }
}
