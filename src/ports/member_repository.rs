use crate::domain::{member::Member, value_objects::MemberId};
use async_trait::async_trait;
use thiserror::Error;

/// 会員リポジトリのエラー
///
/// 一意制約違反はドメイン上の意味を持つため、その他の障害と区別する。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 同じ会員IDのレコードが既に存在する（主キー制約違反）
    #[error("Member {0} already exists")]
    AlreadyExists(MemberId),

    /// メールアドレスが既に登録されている
    #[error("Email already registered")]
    EmailTaken,

    /// ストレージ層の障害
    #[error("Member storage error")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// 会員リポジトリポート
///
/// 会員サービスでは正のデータを、書籍サービスではイベントから
/// 実体化した会員IDのコピーを保存する。
/// 一意性の保証はリポジトリ自身の制約に委ねる（呼び出し側でロックしない）。
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// 会員が存在するか確認する
    async fn exists(&self, member_id: MemberId) -> Result<bool>;

    /// IDで会員を取得する
    async fn get_by_id(&self, member_id: MemberId) -> Result<Option<Member>>;

    /// 会員を作成する
    ///
    /// # エラー
    /// 同じIDが既に存在する場合は`RepositoryError::AlreadyExists`を返す。
    async fn create(&self, member: &Member) -> Result<()>;

    /// 名前・メールアドレスを更新する。対象が存在しない場合はfalse。
    async fn update(&self, member: &Member) -> Result<bool>;

    /// 会員を削除する。対象が存在しない場合はfalse。
    async fn delete(&self, member_id: MemberId) -> Result<bool>;
}
