use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EnvelopeError, MemberId};

/// イベント：会員が作成された
///
/// 会員サービスから書籍サービスへ送られる唯一のドメインイベント。
/// ワイヤ形式は `{"member_id":"<uuid>"}` の1フィールドのみで、
/// スキーマバージョンは持たない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCreated {
    pub member_id: MemberId,
}

/// 受信側の解析用。フィールド欠落と不正値を区別するため文字列で受ける。
#[derive(Deserialize)]
struct WireEnvelope {
    member_id: Option<String>,
}

impl MemberCreated {
    pub fn new(member_id: MemberId) -> Self {
        Self { member_id }
    }

    /// パーティションキー
    ///
    /// 同じ会員のイベントが常に同じパーティションに入るよう、
    /// 会員IDの正規文字列をそのまま使う。
    pub fn partition_key(&self) -> String {
        self.member_id.to_string()
    }

    /// JSONペイロードにシリアライズする
    pub fn to_payload(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(EnvelopeError::Serialize)
    }

    /// 受信したペイロードを解析・検証する
    ///
    /// # エラー
    /// - 空ペイロード、JSON不正、member_id欠落、UUID不正、nil UUID
    pub fn from_payload(payload: &[u8]) -> Result<Self, EnvelopeError> {
        if payload.is_empty() {
            return Err(EnvelopeError::EmptyPayload);
        }

        let wire: WireEnvelope =
            serde_json::from_slice(payload).map_err(EnvelopeError::Malformed)?;
        let raw = wire.member_id.ok_or(EnvelopeError::MissingMemberId)?;
        let uuid = Uuid::parse_str(&raw)
            .map_err(|source| EnvelopeError::InvalidMemberId { value: raw, source })?;

        let member_id = MemberId::from_uuid(uuid);
        if member_id.is_nil() {
            return Err(EnvelopeError::NilMemberId);
        }

        Ok(Self { member_id })
    }
}
