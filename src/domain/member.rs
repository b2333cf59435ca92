use chrono::{DateTime, Utc};

use super::MemberId;

/// 会員
///
/// 会員サービスでは名前とメールアドレスを持つ完全なレコード。
/// 書籍サービスではイベントから作られるIDのみのスタブで、
/// name / email は未設定のまま保持される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub member_id: MemberId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// 会員登録用：新しいIDで作成する
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            member_id: MemberId::new(),
            name: Some(name.into()),
            email: Some(email.into()),
            created_at: Utc::now(),
        }
    }

    /// イベントから作る最小限のレコード（IDのみ）
    pub fn stub(member_id: MemberId) -> Self {
        Self {
            member_id,
            name: None,
            email: None,
            created_at: Utc::now(),
        }
    }

    /// IDのみのスタブか
    pub fn is_stub(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_member_has_details() {
        let member = Member::new("Ada", "ada@example.com");
        assert_eq!(member.name.as_deref(), Some("Ada"));
        assert_eq!(member.email.as_deref(), Some("ada@example.com"));
        assert!(!member.is_stub());
    }

    #[test]
    fn test_stub_member_has_only_id() {
        let member_id = MemberId::new();
        let member = Member::stub(member_id);
        assert_eq!(member.member_id, member_id);
        assert!(member.is_stub());
    }
}
