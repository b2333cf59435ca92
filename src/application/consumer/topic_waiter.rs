use super::shutdown::ShutdownSignal;
use crate::ports::event_broker::TopicMetadata;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// トピック出現待ちの全体の上限
pub const DEFAULT_TOPIC_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// メタデータ取得の間隔
pub const DEFAULT_TOPIC_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 1回のメタデータ取得の上限
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// ブローカーの可用性待ち
///
/// 対象トピックがメタデータに現れるまで一定間隔でポーリングする。
/// 取得中のトランスポートエラーは握りつぶして次の周期で再試行する。
pub struct TopicWaiter {
    metadata: Arc<dyn TopicMetadata>,
    poll_interval: Duration,
    metadata_timeout: Duration,
    shutdown: ShutdownSignal,
}

impl TopicWaiter {
    pub fn new(metadata: Arc<dyn TopicMetadata>) -> Self {
        Self {
            metadata,
            poll_interval: DEFAULT_TOPIC_POLL_INTERVAL,
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_metadata_timeout(mut self, metadata_timeout: Duration) -> Self {
        self.metadata_timeout = metadata_timeout;
        self
    }

    /// 停止要求を受けたらポーリングの合間で待機を打ち切る
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// トピックが利用可能になるまで待つ（ブロッキング）
    ///
    /// # 戻り値
    /// `timeout`以内にトピックが見つかれば`true`。
    /// タイムアウトまたは停止要求の場合は`false`。
    pub fn wait_for_topic(&self, topic: &str, timeout: Duration) -> bool {
        let started = Instant::now();
        tracing::info!(topic, ?timeout, "Waiting for topic");

        loop {
            if self.shutdown.is_triggered() {
                tracing::info!(topic, "Stopped waiting for topic");
                return false;
            }

            // 1回の取得も全体の残り時間を超えない
            let remaining = timeout.saturating_sub(started.elapsed());
            match self.metadata.topic_names(self.metadata_timeout.min(remaining)) {
                Ok(names) if names.iter().any(|name| name == topic) => {
                    tracing::info!(topic, elapsed = ?started.elapsed(), "Topic is ready");
                    return true;
                }
                Ok(_) => tracing::debug!(topic, "Topic not created yet"),
                Err(e) => tracing::debug!(topic, error = %e, "Topic metadata unavailable"),
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                break;
            }
            std::thread::sleep(self.poll_interval.min(timeout - elapsed));
        }

        tracing::error!(topic, ?timeout, "Topic not available");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_broker::BrokerError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 呼び出しごとに用意した応答を返すメタデータ。尽きたら空の一覧。
    struct ScriptedMetadata {
        responses: Mutex<VecDeque<Result<Vec<String>, BrokerError>>>,
        calls: Mutex<usize>,
        timeouts: Mutex<Vec<Duration>>,
    }

    impl ScriptedMetadata {
        fn new(responses: Vec<Result<Vec<String>, BrokerError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
                timeouts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl TopicMetadata for ScriptedMetadata {
        fn topic_names(&self, timeout: Duration) -> Result<Vec<String>, BrokerError> {
            *self.calls.lock().unwrap() += 1;
            self.timeouts.lock().unwrap().push(timeout);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn waiter(metadata: Arc<ScriptedMetadata>) -> TopicWaiter {
        TopicWaiter::new(metadata).with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_topic_present_immediately() {
        let metadata = Arc::new(ScriptedMetadata::new(vec![Ok(vec![
            "other".to_string(),
            "member-created".to_string(),
        ])]));

        assert!(waiter(metadata.clone()).wait_for_topic("member-created", Duration::from_secs(1)));
        assert_eq!(metadata.calls(), 1);
    }

    #[test]
    fn test_topic_appears_after_errors() {
        let metadata = Arc::new(ScriptedMetadata::new(vec![
            Err(BrokerError::Transport("connection refused".to_string())),
            Ok(vec![]),
            Err(BrokerError::Transport("connection refused".to_string())),
            Ok(vec!["member-created".to_string()]),
        ]));

        assert!(waiter(metadata.clone()).wait_for_topic("member-created", Duration::from_secs(5)));
        assert_eq!(metadata.calls(), 4);
    }

    #[test]
    fn test_topic_never_appears() {
        let metadata = Arc::new(ScriptedMetadata::new(vec![]));
        let started = Instant::now();

        let found = waiter(metadata.clone()).wait_for_topic("member-created", Duration::from_millis(40));

        assert!(!found);
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(metadata.calls() >= 2);
    }

    #[test]
    fn test_shutdown_stops_waiting() {
        let metadata = Arc::new(ScriptedMetadata::new(vec![]));
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let found = waiter(metadata.clone())
            .with_shutdown(shutdown)
            .wait_for_topic("member-created", Duration::from_secs(60));

        assert!(!found);
        assert_eq!(metadata.calls(), 0);
    }

    #[test]
    fn test_metadata_requests_are_bounded_by_remaining_wait() {
        let metadata = Arc::new(ScriptedMetadata::new(vec![]));
        let overall = Duration::from_millis(50);

        let found = waiter(metadata.clone())
            .with_metadata_timeout(Duration::from_secs(5))
            .wait_for_topic("member-created", overall);

        assert!(!found);
        let timeouts = metadata.timeouts.lock().unwrap();
        assert!(!timeouts.is_empty());
        assert!(timeouts.iter().all(|timeout| *timeout <= overall));
        // 後の取得ほど残り時間は短い
        assert!(timeouts.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn test_short_metadata_timeout_is_kept() {
        let metadata = Arc::new(ScriptedMetadata::new(vec![Ok(vec![
            "member-created".to_string(),
        ])]));

        waiter(metadata.clone())
            .with_metadata_timeout(Duration::from_millis(20))
            .wait_for_topic("member-created", Duration::from_secs(60));

        assert_eq!(
            *metadata.timeouts.lock().unwrap(),
            vec![Duration::from_millis(20)]
        );
    }
}
