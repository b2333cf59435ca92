//! Kafka transport for member events.
//!
//! Blocking rdkafka clients (`BaseProducer`, `BaseConsumer`) behind the
//! broker ports. Message key: canonical member id (ordering per member).

mod consumer;
mod metadata;
mod producer;

pub use consumer::KafkaConsumer;
pub use metadata::KafkaTopicMetadata;
pub use producer::KafkaProducer;

use crate::config::MessagingConfig;
use rdkafka::ClientConfig;

/// Build a ClientConfig for the member event producer.
///
/// Retries happen inside the client and are never surfaced to callers.
pub fn producer_config(messaging: &MessagingConfig) -> ClientConfig {
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", &messaging.bootstrap_servers);
    config.set("acks", "1");
    config.set("retries", "3");
    config.set("retry.backoff.ms", "300");
    config
}

/// Build a ClientConfig for the books service consumer.
///
/// Offsets are committed automatically on an interval, independent of
/// handler outcome.
pub fn consumer_config(messaging: &MessagingConfig) -> ClientConfig {
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", &messaging.bootstrap_servers);
    config.set("group.id", &messaging.consumer_group);
    config.set("auto.offset.reset", "earliest");
    config.set("enable.auto.commit", "true");
    config.set("auto.commit.interval.ms", "5000");
    config
}

/// Build a ClientConfig for metadata-only lookups (no consumer group).
pub fn metadata_config(messaging: &MessagingConfig) -> ClientConfig {
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", &messaging.bootstrap_servers);
    config
}

#[cfg(test)]
mod tests;
