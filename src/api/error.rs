use crate::application::member::MemberApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(MemberApplicationError);

impl From<MemberApplicationError> for ApiError {
    fn from(err: MemberApplicationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            // 404 Not Found - リクエストされたリソースが存在しない
            MemberApplicationError::MemberNotFound => (StatusCode::NOT_FOUND, "Member not found"),

            // 409 Conflict - 一意制約違反
            MemberApplicationError::EmailAlreadyRegistered => {
                (StatusCode::CONFLICT, "Email already registered")
            }
            MemberApplicationError::AlreadyExists(_) => {
                (StatusCode::CONFLICT, "Member already exists")
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            MemberApplicationError::Repository(ref e) => {
                tracing::error!("Member repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred",
                )
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
