use crate::domain::{events::MemberCreated, value_objects::MemberId};
use crate::ports::event_broker::{DeliveryOutcome, DrainReport, ProducerTransport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 送信1件ごとのドレイン待ち上限
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// 終了時のドレイン待ち上限
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// 会員作成イベントのパブリッシャー
///
/// プロセスごとに1つだけ起動時に構築し、必要なコンポーネントへ
/// 明示的に渡す（グローバルには保持しない）。
///
/// # 配信保証
///
/// `publish`はブローカーの確認応答を待ってから結果を返す。
/// `false`が返った場合イベントは失われたものとして扱い、再送はしない。
/// 呼び出し側の会員作成はロールバックされないため、
/// 書籍サービス側のコピーとの間に結果整合性のギャップが残りうる。
pub struct MemberEventPublisher {
    transport: Arc<dyn ProducerTransport>,
    topic: String,
    flush_timeout: Duration,
    close_timeout: Duration,
    closed: AtomicBool,
}

impl MemberEventPublisher {
    pub fn new(transport: Arc<dyn ProducerTransport>, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            closed: AtomicBool::new(false),
        }
    }

    /// ドレイン待ちの上限を差し替える
    pub fn with_timeouts(mut self, flush_timeout: Duration, close_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self.close_timeout = close_timeout;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 会員作成イベントを送信し、確認応答を待つ
    ///
    /// ブロッキング呼び出し。非同期コンテキストからは
    /// `tokio::task::spawn_blocking`経由で呼ぶこと。
    ///
    /// # 戻り値
    /// ドレインを終えた時点で、この送信自身の配信成功が報告されている場合のみ`true`。
    /// シリアライズ失敗、送信失敗、タイムアウト、配信失敗はすべて`false`（エラーにはしない）。
    /// 他のメッセージの配信結果はこの戻り値に影響しない。
    pub fn publish(&self, member_id: MemberId) -> bool {
        if self.closed.load(Ordering::Acquire) {
            tracing::error!(member_id = %member_id, "Publisher is closed, event dropped");
            return false;
        }

        let event = MemberCreated::new(member_id);
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(member_id = %member_id, error = %e, "Failed to encode member-created event");
                return false;
            }
        };
        let key = event.partition_key();

        tracing::debug!(member_id = %member_id, topic = %self.topic, "Sending member-created event");

        let ticket = match self.transport.send(&self.topic, key.as_bytes(), &payload) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::error!(member_id = %member_id, error = %e, "Failed to enqueue member-created event");
                return false;
            }
        };

        let report = self.transport.flush(self.flush_timeout);
        match ticket.outcome() {
            DeliveryOutcome::Delivered => true,
            DeliveryOutcome::Pending => {
                tracing::warn!(
                    member_id = %member_id,
                    pending = report.pending,
                    "Member-created event not acknowledged"
                );
                false
            }
            DeliveryOutcome::Failed => {
                tracing::warn!(member_id = %member_id, "Member-created event delivery failed");
                false
            }
        }
    }

    /// 残りの送信をドレインして閉じる
    ///
    /// 2回目以降の呼び出しは何もしない。
    pub fn close(&self) -> DrainReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DrainReport::default();
        }

        tracing::info!(topic = %self.topic, "Closing member event publisher");
        let report = self.transport.flush(self.close_timeout);
        if report.is_clean() {
            tracing::info!("Member event publisher closed");
        } else {
            tracing::warn!(
                pending = report.pending,
                "Member event publisher closed with undelivered events"
            );
        }
        report
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
