use std::time::Duration;

use rdkafka::consumer::{BaseConsumer, Consumer};

use crate::config::MessagingConfig;
use crate::ports::event_broker::{BrokerError, TopicMetadata};

/// Cluster metadata lookups through a group-less consumer.
pub struct KafkaTopicMetadata {
    client: BaseConsumer,
}

impl KafkaTopicMetadata {
    pub fn new(messaging: &MessagingConfig) -> Result<Self, BrokerError> {
        let client: BaseConsumer = super::metadata_config(messaging).create().map_err(|e| {
            BrokerError::Configuration(format!("Failed to create Kafka metadata client: {}", e))
        })?;

        Ok(Self { client })
    }
}

impl TopicMetadata for KafkaTopicMetadata {
    /// Names of topics the cluster currently reports without error.
    fn topic_names(&self, timeout: Duration) -> Result<Vec<String>, BrokerError> {
        let metadata = self
            .client
            .fetch_metadata(None, timeout)
            .map_err(|e| BrokerError::Transport(format!("Failed to fetch metadata: {}", e)))?;

        Ok(metadata
            .topics()
            .iter()
            .filter(|topic| topic.error().is_none())
            .map(|topic| topic.name().to_string())
            .collect())
    }
}
