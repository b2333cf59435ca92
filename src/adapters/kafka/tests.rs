use super::*;

fn messaging() -> MessagingConfig {
    MessagingConfig {
        bootstrap_servers: "kafka-1:9092,kafka-2:9092".to_string(),
        ..MessagingConfig::default()
    }
}

#[test]
fn test_producer_config() {
    let config = producer_config(&messaging());
    assert_eq!(config.get("bootstrap.servers"), Some("kafka-1:9092,kafka-2:9092"));
    assert_eq!(config.get("acks"), Some("1"));
    assert_eq!(config.get("retries"), Some("3"));
    assert_eq!(config.get("retry.backoff.ms"), Some("300"));
    assert!(config.get("group.id").is_none());
}

#[test]
fn test_consumer_config() {
    let config = consumer_config(&messaging());
    assert_eq!(config.get("group.id"), Some("books-member-consumer-group"));
    assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
    assert_eq!(config.get("enable.auto.commit"), Some("true"));
    assert_eq!(config.get("auto.commit.interval.ms"), Some("5000"));
}

#[test]
fn test_consumer_config_with_custom_group() {
    let messaging = MessagingConfig {
        consumer_group: "books-replay".to_string(),
        ..messaging()
    };
    let config = consumer_config(&messaging);
    assert_eq!(config.get("group.id"), Some("books-replay"));
}

#[test]
fn test_metadata_config_has_no_group() {
    let config = metadata_config(&messaging());
    assert_eq!(config.get("bootstrap.servers"), Some("kafka-1:9092,kafka-2:9092"));
    assert!(config.get("group.id").is_none());
}

#[test]
fn test_clients_are_created_without_connecting() {
    // librdkafka connects lazily, so creation succeeds without a broker
    let messaging = messaging();
    assert!(KafkaProducer::new(&messaging).is_ok());
    assert!(KafkaConsumer::new(&messaging).is_ok());
    assert!(KafkaTopicMetadata::new(&messaging).is_ok());
}

#[test]
fn test_flush_without_messages_is_clean() {
    let producer = KafkaProducer::new(&messaging()).unwrap();
    let report = crate::ports::event_broker::ProducerTransport::flush(
        &producer,
        std::time::Duration::from_millis(10),
    );
    assert!(report.is_clean());
}

#[test]
fn test_delivery_reports_settle_only_their_own_ticket() {
    use crate::ports::event_broker::{DeliveryOutcome, DeliveryTicket};
    use rdkafka::error::{KafkaError, RDKafkaErrorCode};

    let earlier = DeliveryTicket::new();
    let later = DeliveryTicket::new();

    // A late failure of an earlier send arrives together with a later success
    let timed_out = KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut);
    producer::settle_delivery(&earlier, Err(&timed_out));
    producer::settle_delivery(&later, Ok(()));

    assert_eq!(earlier.outcome(), DeliveryOutcome::Failed);
    assert_eq!(later.outcome(), DeliveryOutcome::Delivered);
}

#[test]
fn test_unacknowledged_sends_keep_their_tickets_pending() {
    use crate::ports::event_broker::{DeliveryOutcome, ProducerTransport};

    let producer = KafkaProducer::new(&messaging()).unwrap();
    let first = producer.send("member-created", b"a", b"{}").unwrap();
    let second = producer.send("member-created", b"b", b"{}").unwrap();

    let report = producer.flush(std::time::Duration::from_millis(10));

    assert_eq!(report.pending, 2);
    assert_eq!(first.outcome(), DeliveryOutcome::Pending);
    assert_eq!(second.outcome(), DeliveryOutcome::Pending);
}
