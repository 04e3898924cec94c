use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single message in flight on the bus: a topic, a partition key (the primary character id,
/// so delivery stays ordered per character), a JSON body, and transport headers.
///
/// Real bus clients (Kafka and friends) carry tenant routing and trace propagation as message
/// headers rather than JSON payload fields; header parsing itself isn't modeled here, but the
/// header *data* still has to cross this boundary, so `headers` stands in for that carrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusMessage {
    pub topic: String,
    pub key: String,
    pub body: Value,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, key: impl Into<String>, body: Value) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            body,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}
