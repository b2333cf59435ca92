use std::time::Duration;

use rdkafka::Message;
use rdkafka::consumer::{BaseConsumer, Consumer};
use tracing::{info, warn};

use crate::config::MessagingConfig;
use crate::ports::event_broker::{BrokerError, ConsumerTransport, ReceivedMessage};

/// Kafka consumer transport.
///
/// Owned by the subscriber thread. Offsets are auto-committed by the client.
pub struct KafkaConsumer {
    consumer: Option<BaseConsumer>,
    group_id: String,
}

impl KafkaConsumer {
    pub fn new(messaging: &MessagingConfig) -> Result<Self, BrokerError> {
        let consumer: BaseConsumer = super::consumer_config(messaging).create().map_err(|e| {
            BrokerError::Configuration(format!("Failed to create Kafka consumer: {}", e))
        })?;

        Ok(Self {
            consumer: Some(consumer),
            group_id: messaging.consumer_group.clone(),
        })
    }
}

impl ConsumerTransport for KafkaConsumer {
    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        let consumer = self.consumer.as_ref().ok_or(BrokerError::Closed)?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| BrokerError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        info!(topic = %topic, group_id = %self.group_id, "Subscribed to Kafka topic");
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Option<Result<ReceivedMessage, BrokerError>> {
        let consumer = self.consumer.as_ref()?;
        let result = consumer.poll(timeout)?;

        Some(
            result
                .map(|message| ReceivedMessage {
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                    key: message.key().map(<[u8]>::to_vec),
                    payload: message.payload().map(<[u8]>::to_vec),
                })
                .map_err(|e| BrokerError::Transport(e.to_string())),
        )
    }

    /// Unsubscribe and drop the client, leaving the group.
    fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.unsubscribe();
            drop(consumer);
            info!(group_id = %self.group_id, "Kafka consumer closed");
        } else {
            warn!("Kafka consumer already closed");
        }
    }
}
