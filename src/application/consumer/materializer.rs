use super::errors::MaterializeError;
use crate::domain::{member::Member, value_objects::MemberId};
use crate::ports::member_repository::{MemberRepository, RepositoryError};
use std::sync::Arc;

/// 実体化の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    /// 新しくレコードを作成した
    Created,
    /// 既に存在していた（重複配信、または競合で他方が先に作成した）
    AlreadyPresent,
}

/// 会員IDの冪等な実体化
///
/// 会員作成イベントを何度受け取っても、ローカルのレコードは高々1件になる。
/// IDに対するロックは取らず、競合時はリポジトリの一意制約に任せる。
pub struct IdempotentMaterializer {
    repository: Arc<dyn MemberRepository>,
}

impl IdempotentMaterializer {
    pub fn new(repository: Arc<dyn MemberRepository>) -> Self {
        Self { repository }
    }

    /// レコードが無ければIDのみのスタブを作成する
    ///
    /// 一意制約違反（同時に処理された重複配信）は成功として扱う。
    ///
    /// # エラー
    /// リポジトリ自体の障害のみ`MaterializeError::Repository`を返す。
    pub async fn ensure_exists(
        &self,
        member_id: MemberId,
    ) -> Result<Materialization, MaterializeError> {
        let existing = self
            .repository
            .get_by_id(member_id)
            .await
            .map_err(MaterializeError::Repository)?;

        if existing.is_some() {
            tracing::info!(member_id = %member_id, "Member already exists");
            return Ok(Materialization::AlreadyPresent);
        }

        match self.repository.create(&Member::stub(member_id)).await {
            Ok(()) => {
                tracing::info!(member_id = %member_id, "Member materialized");
                Ok(Materialization::Created)
            }
            Err(RepositoryError::AlreadyExists(_)) => {
                tracing::info!(member_id = %member_id, "Member created concurrently, skipping");
                Ok(Materialization::AlreadyPresent)
            }
            Err(e) => Err(MaterializeError::Repository(e)),
        }
    }
}
