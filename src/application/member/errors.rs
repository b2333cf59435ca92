use crate::domain::value_objects::MemberId;
use crate::ports::member_repository::RepositoryError;
use thiserror::Error;

/// 会員管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum MemberApplicationError {
    /// 会員が存在しない
    #[error("Member not found")]
    MemberNotFound,

    /// メールアドレスが既に登録されている
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// 同じIDの会員が既に存在する
    #[error("Member {0} already exists")]
    AlreadyExists(MemberId),

    /// MemberRepositoryのエラー
    #[error("Member repository error")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for MemberApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AlreadyExists(member_id) => Self::AlreadyExists(member_id),
            RepositoryError::EmailTaken => Self::EmailAlreadyRegistered,
            other => Self::Repository(other),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, MemberApplicationError>;
