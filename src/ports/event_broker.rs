use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use thiserror::Error;

/// メッセージブローカーのエラー
#[derive(Debug, Error)]
pub enum BrokerError {
    /// ブローカーに到達できない、ポーリング・送信の失敗など（一時的）
    #[error("Broker transport error: {0}")]
    Transport(String),

    /// クライアント設定が不正（起動時の致命的エラー）
    #[error("Invalid broker configuration: {0}")]
    Configuration(String),

    /// 購読に失敗した
    #[error("Failed to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },

    /// 送信キューが既に閉じられている
    #[error("Producer is closed")]
    Closed,
}

/// 送信キューのドレイン結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// タイムアウト時点でまだ確認応答を受けていない件数
    pub pending: usize,
}

impl DrainReport {
    /// 保留中が0件か
    pub fn is_clean(&self) -> bool {
        self.pending == 0
    }
}

/// 1件の送信の配信結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 配信レポート未着
    Pending,
    Delivered,
    Failed,
}

const PENDING: u8 = 0;
const DELIVERED: u8 = 1;
const FAILED: u8 = 2;

/// 1件の送信に対応する配信結果の受け取り口
///
/// 送信時にトランスポートが発行し、そのメッセージの配信レポートで確定させる。
/// クローンは同じ結果を共有する。最初に確定した結果だけが残る。
#[derive(Debug, Clone, Default)]
pub struct DeliveryTicket {
    state: Arc<AtomicU8>,
}

impl DeliveryTicket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_delivered(&self) {
        self.settle(DELIVERED);
    }

    pub fn mark_failed(&self) {
        self.settle(FAILED);
    }

    fn settle(&self, outcome: u8) {
        let _ = self
            .state
            .compare_exchange(PENDING, outcome, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn outcome(&self) -> DeliveryOutcome {
        match self.state.load(Ordering::Acquire) {
            DELIVERED => DeliveryOutcome::Delivered,
            FAILED => DeliveryOutcome::Failed,
            _ => DeliveryOutcome::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome() == DeliveryOutcome::Pending
    }
}

/// 受信したメッセージ
///
/// ブローカークライアントの借用メッセージから切り離した所有型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

/// 送信側トランスポートポート
///
/// ブロッキングAPI。リトライは実装側（ブローカークライアント）に任せ、
/// 呼び出し側には見せない。
pub trait ProducerTransport: Send + Sync {
    /// メッセージを送信キューに積む
    ///
    /// 返したチケットはこのメッセージの配信レポートでのみ確定させること。
    fn send(
        &self,
        topic: &str,
        key: &[u8],
        payload: &[u8],
    ) -> Result<DeliveryTicket, BrokerError>;

    /// 送信キューを最大`timeout`までドレインする
    ///
    /// 今回の送信を含むすべての保留メッセージが対象。
    fn flush(&self, timeout: Duration) -> DrainReport;
}

/// 受信側トランスポートポート
///
/// ブロッキングAPI。専用スレッドのポーリングループから所有・使用される。
pub trait ConsumerTransport: Send {
    /// トピックを購読する
    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError>;

    /// 最大`timeout`待ってメッセージを1件取得する
    ///
    /// メッセージが無ければ`None`。ブローカーが報告したエラーは`Some(Err)`。
    fn poll(&mut self, timeout: Duration) -> Option<Result<ReceivedMessage, BrokerError>>;

    /// 購読を解除してハンドルを閉じる
    fn close(&mut self);
}

/// トピックメタデータポート
pub trait TopicMetadata: Send + Sync {
    /// ブローカー上のトピック名一覧を取得する
    fn topic_names(&self, timeout: Duration) -> Result<Vec<String>, BrokerError>;
}
