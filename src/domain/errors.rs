use thiserror::Error;

/// イベントエンベロープの解析エラー
///
/// いずれもメッセージ単位のローカルな失敗で、再試行されない。
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// ペイロードが空
    #[error("Empty payload")]
    EmptyPayload,

    /// JSONとして解析できない、またはオブジェクト形式でない
    #[error("Malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// member_id フィールドが存在しない
    #[error("Missing member_id field")]
    MissingMemberId,

    /// member_id がUUIDとして解析できない
    #[error("Invalid member_id {value:?}")]
    InvalidMemberId {
        value: String,
        #[source]
        source: uuid::Error,
    },

    /// member_id がnil UUID
    #[error("member_id must not be the nil UUID")]
    NilMemberId,

    /// シリアライズに失敗（送信側）
    #[error("Failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}
