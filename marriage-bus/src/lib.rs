pub mod client;
pub mod envelope;
pub mod in_memory;

pub use client::{BusConsumer, BusError, BusPublisher, BusSubscription};
pub use envelope::BusMessage;
pub use in_memory::InMemoryBus;
