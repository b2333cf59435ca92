use crate::application::consumer::SubscriberStatus;
use crate::application::member::{
    ServiceDependencies, get_member as execute_get_member,
    register_member as execute_register_member,
};
use crate::domain::value_objects::MemberId;
use crate::ports::member_repository::MemberRepository;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{MemberResponse, RegisterMemberRequest},
};

// ============================================================================
// State
// ============================================================================

/// 会員サービスのハンドラー間で共有される状態
#[derive(Clone)]
pub struct MembersState {
    pub service_deps: ServiceDependencies,
}

/// 書籍サービスのハンドラー間で共有される状態
#[derive(Clone)]
pub struct BooksState {
    pub member_repository: Arc<dyn MemberRepository>,
    /// 購読ループが起動できなかった場合は`None`
    pub subscriber_status: Option<Arc<SubscriberStatus>>,
}

// ============================================================================
// Members service
// ============================================================================

/// POST /members - 会員を登録
///
/// 登録後に会員作成イベントを発行する。発行に失敗しても201を返す。
pub async fn register_member(
    State(state): State<Arc<MembersState>>,
    Json(req): Json<RegisterMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let member = execute_register_member(&state.service_deps, req.to_command()).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// GET /members/:id - 会員をIDで取得
pub async fn get_registered_member(
    State(state): State<Arc<MembersState>>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = execute_get_member(
        &state.service_deps.member_repository,
        MemberId::from_uuid(member_id),
    )
    .await?;

    Ok(Json(MemberResponse::from(member)))
}

// ============================================================================
// Books service
// ============================================================================

/// GET /members/:id - 実体化された会員のコピーを取得
pub async fn get_materialized_member(
    State(state): State<Arc<BooksState>>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member =
        execute_get_member(&state.member_repository, MemberId::from_uuid(member_id)).await?;

    Ok(Json(MemberResponse::from(member)))
}

/// GET /health - 書籍サービスのヘルスチェック
///
/// 購読ループの状態を付けて返す。HTTPは購読ループの状態に関わらず200。
pub async fn books_health(State(state): State<Arc<BooksState>>) -> String {
    match &state.subscriber_status {
        Some(status) => format!("OK (subscriber: {:?})", status.current()),
        None => "OK (subscriber: not running)".to_string(),
    }
}
