use std::time::Duration;

use rdkafka::ClientContext;
use rdkafka::Message;
use rdkafka::error::KafkaError;
use rdkafka::producer::{BaseProducer, BaseRecord, DeliveryResult, Producer, ProducerContext};
use tracing::{debug, error, info};

use crate::config::MessagingConfig;
use crate::ports::event_broker::{BrokerError, DeliveryTicket, DrainReport, ProducerTransport};

/// Producer context that settles each message's delivery ticket.
///
/// Delivery reports are served from `poll`/`flush` on the calling thread.
/// The ticket travels with the message as its delivery opaque.
#[derive(Debug, Default)]
pub struct DeliveryTracker;

impl ClientContext for DeliveryTracker {}

impl ProducerContext for DeliveryTracker {
    type DeliveryOpaque = Box<DeliveryTicket>;

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, delivery_opaque: Self::DeliveryOpaque) {
        match delivery_result {
            Ok(message) => {
                debug!(
                    topic = %message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    "Member event delivered"
                );
                settle_delivery(&delivery_opaque, Ok(()));
            }
            Err((e, message)) => {
                error!(
                    topic = %message.topic(),
                    error = %e,
                    "Member event delivery failed"
                );
                settle_delivery(&delivery_opaque, Err(e));
            }
        }
    }
}

/// Record one delivery report on the ticket of the message it belongs to.
pub(super) fn settle_delivery(ticket: &DeliveryTicket, result: Result<(), &KafkaError>) {
    match result {
        Ok(()) => ticket.mark_delivered(),
        Err(_) => ticket.mark_failed(),
    }
}

/// Kafka producer transport.
pub struct KafkaProducer {
    producer: BaseProducer<DeliveryTracker>,
}

impl KafkaProducer {
    /// Create a producer. No broker connection is made until the first send.
    pub fn new(messaging: &MessagingConfig) -> Result<Self, BrokerError> {
        let producer: BaseProducer<DeliveryTracker> = super::producer_config(messaging)
            .create_with_context(DeliveryTracker)
            .map_err(|e| {
                BrokerError::Configuration(format!("Failed to create Kafka producer: {}", e))
            })?;

        info!(
            bootstrap_servers = %messaging.bootstrap_servers,
            "Kafka producer created"
        );

        Ok(Self { producer })
    }
}

impl ProducerTransport for KafkaProducer {
    fn send(
        &self,
        topic: &str,
        key: &[u8],
        payload: &[u8],
    ) -> Result<DeliveryTicket, BrokerError> {
        let ticket = DeliveryTicket::new();
        let record = BaseRecord::with_opaque_to(topic, Box::new(ticket.clone()))
            .key(key)
            .payload(payload);
        self.producer
            .send(record)
            .map_err(|(e, _)| BrokerError::Transport(format!("Failed to enqueue: {}", e)))?;

        // Serve delivery reports of earlier sends
        self.producer.poll(Duration::ZERO);
        Ok(ticket)
    }

    fn flush(&self, timeout: Duration) -> DrainReport {
        if let Err(e) = self.producer.flush(timeout) {
            debug!(error = %e, "Producer flush did not complete");
        }

        DrainReport {
            pending: self.producer.in_flight_count().max(0) as usize,
        }
    }
}
