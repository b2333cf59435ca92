use crate::application::publishing::MemberEventPublisher;
use crate::domain::{member::Member, value_objects::MemberId};
use crate::ports::member_repository::MemberRepository;
use std::sync::Arc;

use super::errors::{MemberApplicationError, Result};

/// 会員登録コマンド
#[derive(Debug, Clone)]
pub struct RegisterMember {
    pub name: String,
    pub email: String,
}

/// 会員サービスの依存関係
///
/// パブリッシャーは起動時に1つだけ構築し、ここから明示的に渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub member_repository: Arc<dyn MemberRepository>,
    pub publisher: Arc<MemberEventPublisher>,
}

/// 会員を登録し、会員作成イベントを発行する
///
/// # 一貫性保証
///
/// 会員の永続化が先に確定し、その後でイベントを発行する。
/// 発行に失敗しても登録はロールバックせず、警告ログを残して成功を返す。
/// この場合、書籍サービス側のコピーは作られないまま残る（既知の制約）。
///
/// # エラー
/// - EmailAlreadyRegistered: メールアドレスが登録済み
/// - Repository: 永続化の失敗（この場合イベントは発行しない）
pub async fn register_member(deps: &ServiceDependencies, cmd: RegisterMember) -> Result<Member> {
    // 1. 永続化
    let member = Member::new(cmd.name, cmd.email);
    deps.member_repository.create(&member).await?;

    // 2. イベント発行（ブローカーの確認応答をブロッキングで待つ）
    let publisher = Arc::clone(&deps.publisher);
    let member_id = member.member_id;
    let published = tokio::task::spawn_blocking(move || publisher.publish(member_id))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(member_id = %member_id, error = %e, "Publish task failed");
            false
        });

    if !published {
        tracing::warn!(
            member_id = %member_id,
            "Member created but member-created event not published"
        );
    }

    Ok(member)
}

/// IDで会員を取得する
///
/// # エラー
/// - MemberNotFound: 会員が存在しない
pub async fn get_member(
    member_repository: &Arc<dyn MemberRepository>,
    member_id: MemberId,
) -> Result<Member> {
    member_repository
        .get_by_id(member_id)
        .await?
        .ok_or(MemberApplicationError::MemberNotFound)
}
