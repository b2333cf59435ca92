use super::errors::{DispatchError, SubscriberError};
use super::materializer::{IdempotentMaterializer, Materialization};
use super::shutdown::ShutdownSignal;
use super::topic_waiter::{DEFAULT_TOPIC_WAIT_TIMEOUT, TopicWaiter};
use super::worker_pool::WorkerPool;
use crate::domain::{events::MemberCreated, value_objects::MemberId};
use crate::ports::event_broker::{ConsumerTransport, ReceivedMessage};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// ポーリング1回あたりの待ち時間の既定値
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// ハンドラー完了待ちの既定値
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

const THREAD_NAME: &str = "member-event-consumer";

/// 購読ループの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Initializing,
    WaitingForTopic,
    Subscribed,
    Polling,
    Stopped,
}

/// 購読ループの状態遷移の記録
///
/// 別スレッドから現在の状態と過去の遷移を観測できる。
#[derive(Debug)]
pub struct SubscriberStatus {
    history: Mutex<Vec<SubscriberState>>,
}

impl SubscriberStatus {
    fn new() -> Self {
        Self {
            history: Mutex::new(vec![SubscriberState::Initializing]),
        }
    }

    fn transition(&self, state: SubscriberState) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        // Polling ⇄ Polling の自己遷移は記録しない
        if history.last() != Some(&state) {
            tracing::debug!(?state, "Subscriber state changed");
            history.push(state);
        }
    }

    pub fn current(&self) -> SubscriberState {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .copied()
            .unwrap_or(SubscriberState::Initializing)
    }

    pub fn history(&self) -> Vec<SubscriberState> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 一度でも購読状態に入ったか
    pub fn has_subscribed(&self) -> bool {
        self.history().contains(&SubscriberState::Subscribed)
    }
}

/// 購読ループの設定
#[derive(Debug, Clone)]
pub struct SubscriberSettings {
    pub topic: String,
    pub topic_wait_timeout: Duration,
    pub poll_timeout: Duration,
    pub handler_timeout: Duration,
}

impl SubscriberSettings {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            topic_wait_timeout: DEFAULT_TOPIC_WAIT_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }
}

/// 購読ループの処理件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// ハンドラーが成功したメッセージ
    pub processed: u64,
    /// 解析・検証に失敗して破棄したメッセージ
    pub dropped: u64,
    /// ハンドラーの失敗・タイムアウト
    pub failed: u64,
    /// ブローカーが報告したポーリングエラー
    pub poll_errors: u64,
}

/// 会員作成イベントの購読ループ
///
/// ブロッキングなブローカークライアントを専用スレッドで所有し、
/// 受信したメッセージを1件ずつワーカープールで処理する。
///
/// # 処理順序
///
/// 1件ごとにハンドラーの完了（またはタイムアウト）を待ってから次をポーリングするため、
/// パーティション内の順序は保たれ、同時に実行されるハンドラーは高々1つ。
///
/// # オフセット
///
/// オフセットはブローカークライアントが一定間隔で自動コミットする。
/// ハンドラーの成否とは連動しないため、失敗直後にコミットされた
/// メッセージは再配信されない（at-most-onceになる窓がある）。
pub struct MemberEventSubscriber {
    consumer: Box<dyn ConsumerTransport>,
    waiter: TopicWaiter,
    pool: WorkerPool,
    materializer: Arc<IdempotentMaterializer>,
    settings: SubscriberSettings,
    shutdown: ShutdownSignal,
    status: Arc<SubscriberStatus>,
}

impl MemberEventSubscriber {
    /// 購読ループを構築する
    ///
    /// `waiter`には購読ループと同じ停止フラグが設定される。
    pub fn new(
        consumer: Box<dyn ConsumerTransport>,
        waiter: TopicWaiter,
        pool: WorkerPool,
        materializer: Arc<IdempotentMaterializer>,
        settings: SubscriberSettings,
    ) -> Self {
        let shutdown = ShutdownSignal::new();
        Self {
            consumer,
            waiter: waiter.with_shutdown(shutdown.clone()),
            pool,
            materializer,
            settings,
            shutdown,
            status: Arc::new(SubscriberStatus::new()),
        }
    }

    pub fn status(&self) -> Arc<SubscriberStatus> {
        Arc::clone(&self.status)
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// 専用スレッドでループを開始する
    pub fn spawn(self) -> std::io::Result<SubscriberHandle> {
        let shutdown = self.shutdown.clone();
        let status = self.status();
        let thread = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())?;

        Ok(SubscriberHandle {
            shutdown,
            status,
            thread,
        })
    }

    /// ループを現在のスレッドで実行する（停止されるまで戻らない）
    ///
    /// tokioのワーカースレッドから呼んではならない。
    ///
    /// # エラー
    /// トピックが現れない、または購読に失敗した場合。
    /// いずれの場合もメッセージは一切消費されない。
    /// トピック待ちの間に停止要求を受けた場合はエラーにせず空の件数を返す。
    pub fn run(mut self) -> Result<ConsumerStats, SubscriberError> {
        let topic = self.settings.topic.clone();
        tracing::info!(topic = %topic, "Starting member event subscriber");

        self.status.transition(SubscriberState::WaitingForTopic);
        if !self
            .waiter
            .wait_for_topic(&topic, self.settings.topic_wait_timeout)
        {
            self.finish();
            if self.shutdown.is_triggered() {
                tracing::info!(topic = %topic, "Member event subscriber stopped before subscribing");
                return Ok(ConsumerStats::default());
            }
            return Err(SubscriberError::TopicUnavailable {
                topic,
                waited: self.settings.topic_wait_timeout,
            });
        }

        if let Err(e) = self.consumer.subscribe(&topic) {
            tracing::error!(topic = %topic, error = %e, "Failed to subscribe");
            self.finish();
            return Err(SubscriberError::Subscribe(e));
        }
        self.status.transition(SubscriberState::Subscribed);
        tracing::info!(topic = %topic, "Subscribed, waiting for messages");

        let mut stats = ConsumerStats::default();
        while !self.shutdown.is_triggered() {
            self.status.transition(SubscriberState::Polling);

            match self.consumer.poll(self.settings.poll_timeout) {
                None => continue,
                Some(Err(e)) => {
                    stats.poll_errors += 1;
                    tracing::error!(error = %e, "Broker poll error");
                }
                Some(Ok(message)) => self.handle_message(message, &mut stats),
            }
        }

        self.finish();
        tracing::info!(
            processed = stats.processed,
            dropped = stats.dropped,
            failed = stats.failed,
            poll_errors = stats.poll_errors,
            "Member event subscriber stopped"
        );
        Ok(stats)
    }

    fn handle_message(&self, message: ReceivedMessage, stats: &mut ConsumerStats) {
        tracing::debug!(
            partition = message.partition,
            offset = message.offset,
            "Message received"
        );

        let event = match MemberCreated::from_payload(message.payload.as_deref().unwrap_or_default())
        {
            Ok(event) => event,
            Err(e) => {
                // 再試行も隔離もせずに破棄する
                stats.dropped += 1;
                tracing::warn!(
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Dropping invalid member-created message"
                );
                return;
            }
        };

        let member_id = event.member_id;
        let materializer = Arc::clone(&self.materializer);
        let result = self.pool.submit(
            move |member_id: MemberId| async move { materializer.ensure_exists(member_id).await },
            member_id,
            self.settings.handler_timeout,
        );

        match result {
            Ok(outcome) => {
                stats.processed += 1;
                let created = outcome == Materialization::Created;
                tracing::info!(
                    member_id = %member_id,
                    created,
                    total = stats.processed,
                    "Processed member-created event"
                );
            }
            Err(DispatchError::Timeout(waited)) => {
                stats.failed += 1;
                tracing::error!(member_id = %member_id, ?waited, "Member-created handler timed out");
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!(member_id = %member_id, error = %e, "Member-created handler failed");
            }
        }
    }

    /// 受付停止 → 実行中タスクのドレイン → コンシューマーを閉じる
    fn finish(&mut self) {
        self.pool.shutdown();
        self.consumer.close();
        self.status.transition(SubscriberState::Stopped);
    }
}

/// 別スレッドで動く購読ループへのハンドル
pub struct SubscriberHandle {
    shutdown: ShutdownSignal,
    status: Arc<SubscriberStatus>,
    thread: JoinHandle<Result<ConsumerStats, SubscriberError>>,
}

impl SubscriberHandle {
    /// 停止を要求してすぐに戻る
    ///
    /// ループが停止に気付くのは現在のポーリングが終わった後。
    pub fn stop(&self) {
        tracing::info!("Stopping member event subscriber");
        self.shutdown.trigger();
    }

    pub fn state(&self) -> SubscriberState {
        self.status.current()
    }

    pub fn status(&self) -> Arc<SubscriberStatus> {
        Arc::clone(&self.status)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// ループの終了を待つ
    ///
    /// スレッドがパニックした場合は`SubscriberError::Panicked`。
    pub fn join(self) -> Result<ConsumerStats, SubscriberError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Member event subscriber thread panicked");
                self.status.transition(SubscriberState::Stopped);
                Err(SubscriberError::Panicked)
            }
        }
    }
}
