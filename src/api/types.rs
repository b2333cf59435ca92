use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::member::RegisterMember;
use crate::domain::member::Member;

/// 会員登録リクエスト（POST /members）
#[derive(Debug, Deserialize)]
pub struct RegisterMemberRequest {
    pub name: String,
    pub email: String,
}

impl RegisterMemberRequest {
    pub fn to_command(&self) -> RegisterMember {
        RegisterMember {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// 会員レスポンス（POST /members と GET /members/:id）
///
/// 書籍サービス側のコピーはname/emailを持たない。
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberResponse {
    pub member_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            member_id: member.member_id.value(),
            name: member.name,
            email: member.email,
            created_at: member.created_at,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
