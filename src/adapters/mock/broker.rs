use crate::ports::event_broker::{
    BrokerError, ConsumerTransport, DeliveryTicket, DrainReport, ProducerTransport,
    ReceivedMessage, TopicMetadata,
};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A single stored record (single partition per topic)
#[derive(Debug, Clone)]
struct StoredRecord {
    key: Option<Vec<u8>>,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Vec<StoredRecord>>,
    /// Sends waiting for acknowledgement
    pending: Vec<(String, StoredRecord, DeliveryTicket)>,
    /// Committed position per consumer group and topic
    committed: HashMap<(String, String), usize>,
    unreachable: bool,
    stalled: bool,
    rejecting: bool,
    subscriptions: usize,
}

/// In-memory message broker
///
/// Implements the producer, consumer and metadata ports with one partition
/// per topic. Sending to an unknown topic creates it, like a broker with
/// topic auto-creation enabled.
///
/// Failure modes can be switched on for testing:
/// - `set_reachable(false)`: metadata and poll calls return transport errors
/// - `stall_acknowledgements(true)`: sends stay pending and flushes time out
/// - `reject_deliveries(true)`: flushed sends are reported as failed and discarded
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
    arrived: Condvar,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create an empty topic
    pub fn create_topic(&self, topic: &str) {
        self.lock().topics.entry(topic.to_string()).or_default();
    }

    /// Append a raw record, bypassing acknowledgement (e.g. a poison message)
    pub fn inject(&self, topic: &str, key: Option<&[u8]>, payload: &[u8]) {
        let mut state = self.lock();
        state
            .topics
            .entry(topic.to_string())
            .or_default()
            .push(StoredRecord {
                key: key.map(<[u8]>::to_vec),
                payload: payload.to_vec(),
            });
        self.arrived.notify_all();
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.lock().unreachable = !reachable;
    }

    /// While stalled, sends are queued but never acknowledged
    pub fn stall_acknowledgements(&self, stalled: bool) {
        self.lock().stalled = stalled;
    }

    /// While rejecting, flushed sends fail instead of being stored
    pub fn reject_deliveries(&self, rejecting: bool) {
        self.lock().rejecting = rejecting;
    }

    /// Stored (acknowledged) payloads of a topic in offset order
    pub fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        self.records(topic).into_iter().map(|(_, p)| p).collect()
    }

    /// Stored (acknowledged) keys and payloads of a topic in offset order
    pub fn records(&self, topic: &str) -> Vec<(Option<Vec<u8>>, Vec<u8>)> {
        self.lock()
            .topics
            .get(topic)
            .map(|records| {
                records
                    .iter()
                    .map(|r| (r.key.clone(), r.payload.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of sends not yet acknowledged
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of successful `subscribe` calls across all consumers
    pub fn subscriptions(&self) -> usize {
        self.lock().subscriptions
    }

    /// Create a consumer in the given group
    ///
    /// New groups start from the earliest record.
    pub fn consumer(self: &Arc<Self>, group_id: impl Into<String>) -> InMemoryConsumer {
        InMemoryConsumer {
            broker: Arc::clone(self),
            group_id: group_id.into(),
            topic: None,
        }
    }
}

impl ProducerTransport for InMemoryBroker {
    fn send(
        &self,
        topic: &str,
        key: &[u8],
        payload: &[u8],
    ) -> Result<DeliveryTicket, BrokerError> {
        let ticket = DeliveryTicket::new();
        let mut state = self.lock();
        state.pending.push((
            topic.to_string(),
            StoredRecord {
                key: Some(key.to_vec()),
                payload: payload.to_vec(),
            },
            ticket.clone(),
        ));
        Ok(ticket)
    }

    /// Settles every pending send unless stalled or unreachable
    ///
    /// Returns immediately; a stalled broker reports the sends as still pending.
    fn flush(&self, _timeout: Duration) -> DrainReport {
        let mut state = self.lock();
        if state.stalled || state.unreachable {
            return DrainReport {
                pending: state.pending.len(),
            };
        }

        let pending = std::mem::take(&mut state.pending);
        for (topic, record, ticket) in pending {
            if state.rejecting {
                ticket.mark_failed();
            } else {
                state.topics.entry(topic).or_default().push(record);
                ticket.mark_delivered();
            }
        }
        self.arrived.notify_all();
        DrainReport::default()
    }
}

impl TopicMetadata for InMemoryBroker {
    fn topic_names(&self, _timeout: Duration) -> Result<Vec<String>, BrokerError> {
        let state = self.lock();
        if state.unreachable {
            return Err(BrokerError::Transport("broker unreachable".to_string()));
        }
        Ok(state.topics.keys().cloned().collect())
    }
}

/// Consumer handle of the in-memory broker
///
/// The group position advances as soon as a record is handed out,
/// which corresponds to an auto-commit that fires immediately.
pub struct InMemoryConsumer {
    broker: Arc<InMemoryBroker>,
    group_id: String,
    topic: Option<String>,
}

impl ConsumerTransport for InMemoryConsumer {
    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        let mut state = self.broker.lock();
        if state.unreachable {
            return Err(BrokerError::Subscribe {
                topic: topic.to_string(),
                reason: "broker unreachable".to_string(),
            });
        }
        state.subscriptions += 1;
        self.topic = Some(topic.to_string());
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Option<Result<ReceivedMessage, BrokerError>> {
        let topic = self.topic.clone()?;
        let deadline = Instant::now() + timeout;
        let group_key = (self.group_id.clone(), topic.clone());
        let mut state = self.broker.lock();

        loop {
            if state.unreachable {
                return Some(Err(BrokerError::Transport("broker unreachable".to_string())));
            }

            let position = state.committed.get(&group_key).copied().unwrap_or(0);
            let next = state
                .topics
                .get(&topic)
                .and_then(|records| records.get(position))
                .cloned();
            if let Some(record) = next {
                state.committed.insert(group_key, position + 1);
                return Some(Ok(ReceivedMessage {
                    topic,
                    partition: 0,
                    offset: position as i64,
                    key: record.key,
                    payload: Some(record.payload),
                }));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            state = self
                .broker
                .arrived
                .wait_timeout(state, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    fn close(&mut self) {
        self.topic = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ports::event_broker::DeliveryOutcome;

    #[test]
    fn test_send_is_stored_after_flush() {
        let broker = InMemoryBroker::new();
        let ticket = broker.send("member-created", b"k", b"v").unwrap();
        assert_eq!(broker.pending(), 1);
        assert!(ticket.is_pending());
        assert!(broker.payloads("member-created").is_empty());

        assert!(broker.flush(Duration::from_millis(10)).is_clean());

        assert_eq!(ticket.outcome(), DeliveryOutcome::Delivered);
        assert_eq!(broker.pending(), 0);
        assert_eq!(broker.records("member-created"), vec![(Some(b"k".to_vec()), b"v".to_vec())]);
    }

    #[test]
    fn test_stalled_flush_reports_pending() {
        let broker = InMemoryBroker::new();
        broker.stall_acknowledgements(true);
        let ticket = broker.send("member-created", b"k", b"v").unwrap();

        let report = broker.flush(Duration::from_millis(10));

        assert_eq!(report.pending, 1);
        assert!(ticket.is_pending());
        assert!(broker.payloads("member-created").is_empty());
    }

    #[test]
    fn test_rejected_delivery_fails_only_flushed_sends() {
        let broker = InMemoryBroker::new();
        broker.reject_deliveries(true);
        let rejected = broker.send("member-created", b"a", b"first").unwrap();
        assert!(broker.flush(Duration::from_millis(10)).is_clean());

        broker.reject_deliveries(false);
        let accepted = broker.send("member-created", b"b", b"second").unwrap();
        broker.flush(Duration::from_millis(10));

        assert_eq!(rejected.outcome(), DeliveryOutcome::Failed);
        assert_eq!(accepted.outcome(), DeliveryOutcome::Delivered);
        assert_eq!(broker.payloads("member-created"), vec![b"second".to_vec()]);
    }

    #[test]
    fn test_consumer_reads_from_earliest_and_resumes_group_position() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.inject("member-created", None, b"first");
        broker.inject("member-created", None, b"second");

        let mut consumer = broker.consumer("books");
        consumer.subscribe("member-created").unwrap();
        let first = consumer.poll(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.payload.as_deref(), Some(&b"first"[..]));
        consumer.close();

        let mut resumed = broker.consumer("books");
        resumed.subscribe("member-created").unwrap();
        let second = resumed.poll(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(second.offset, 1);

        let mut other_group = broker.consumer("audit");
        other_group.subscribe("member-created").unwrap();
        assert_eq!(
            other_group.poll(Duration::from_millis(10)).unwrap().unwrap().offset,
            0
        );
    }

    #[test]
    fn test_poll_times_out_without_messages() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut consumer = broker.consumer("books");
        consumer.subscribe("member-created").unwrap();
        let started = Instant::now();

        assert!(consumer.poll(Duration::from_millis(20)).is_none());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_unreachable_broker_reports_errors() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut consumer = broker.consumer("books");
        consumer.subscribe("member-created").unwrap();
        broker.set_reachable(false);

        assert!(broker.topic_names(Duration::from_millis(10)).is_err());
        assert!(matches!(
            consumer.poll(Duration::from_millis(10)),
            Some(Err(BrokerError::Transport(_)))
        ));
    }
}
