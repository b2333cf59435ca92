use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 会員ID - 会員管理コンテキストの集約ID
///
/// 会員サービスと書籍サービスの間で共有される唯一の識別子。
/// イベントのパーティションキーにも使用される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }

    /// 全ビットが0のUUIDか
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

/// ハイフン区切りの正規形（小文字）で表示する
impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
