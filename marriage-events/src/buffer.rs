use marriage_bus::{BusError, BusMessage, BusPublisher};

/// Accumulates messages across one logical Processor operation and flushes them to the bus
/// under a single sweep. Keyed by topic → ordered list, since a single operation may in
/// principle touch more than one outbound topic, though in this domain every write operation
/// only ever targets the status topic.
///
/// Not a distributed transaction: the database write happens before this buffer is ever
/// touched, and a flush failure here is reported to the caller without rolling back that write.
/// Write-then-publish, not write-and-publish atomically.
#[derive(Debug, Default)]
pub struct EventBuffer {
    topics: Vec<(String, Vec<BusMessage>)>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: BusMessage) {
        if let Some((_, messages)) = self.topics.iter_mut().find(|(topic, _)| *topic == message.topic) {
            messages.push(message);
        } else {
            self.topics.push((message.topic.clone(), vec![message]));
        }
    }

    pub fn push_all(&mut self, messages: impl IntoIterator<Item = BusMessage>) {
        for message in messages {
            self.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.iter().all(|(_, messages)| messages.is_empty())
    }

    pub fn len(&self) -> usize {
        self.topics.iter().map(|(_, messages)| messages.len()).sum()
    }

    /// Flushes every buffered message, topic by topic, preserving insertion order within each
    /// topic.
    pub async fn flush(self, bus: &dyn BusPublisher) -> Result<(), BusError> {
        for (_, messages) in self.topics {
            bus.publish_all(messages).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBus {
        published: Mutex<Vec<BusMessage>>,
    }

    #[async_trait]
    impl BusPublisher for RecordingBus {
        async fn publish(&self, message: BusMessage) -> Result<(), BusError> {
            self.published.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[tokio::test]
    async fn flush_preserves_insertion_order() {
        let mut buffer = EventBuffer::new();
        buffer.push(BusMessage::new("status", "1", json!({"seq": 1})));
        buffer.push(BusMessage::new("status", "1", json!({"seq": 2})));

        let bus = RecordingBus::default();
        buffer.flush(&bus).await.unwrap();

        let published = bus.published.lock().unwrap();
        assert_eq!(published[0].body["seq"], 1);
        assert_eq!(published[1].body["seq"], 2);
    }

    #[test]
    fn empty_buffer_reports_empty() {
        assert!(EventBuffer::new().is_empty());
    }
}
