use crate::ports::member_repository::RepositoryError;
use std::time::Duration;
use thiserror::Error;

/// 冪等な実体化のエラー
///
/// 一意制約違反はここには現れない（成功として扱われる）。
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Member repository error")]
    Repository(#[source] RepositoryError),
}

/// ワーカープールへの投入エラー
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 待機時間内にタスクが完了しなかった（タスク自体は継続する）
    #[error("Handler did not finish within {0:?}")]
    Timeout(Duration),

    /// ハンドラーがエラーを返した
    #[error("Handler failed")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ハンドラーがパニックした
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// プールが停止済みで新しいタスクを受け付けない
    #[error("Worker pool is shut down")]
    ShutDown,
}

/// 購読ループのエラー
///
/// メッセージング部分だけを中止し、サービス自体は継続する。
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// 待機時間内にトピックが現れなかった
    #[error("Topic {topic} not available after {waited:?}")]
    TopicUnavailable { topic: String, waited: Duration },

    /// 購読に失敗した
    #[error("Subscription failed")]
    Subscribe(#[source] crate::ports::event_broker::BrokerError),

    /// 購読ループのスレッドがパニックした
    #[error("Subscriber thread panicked")]
    Panicked,
}
