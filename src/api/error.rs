use crate::application::catalog::CatalogError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ApiResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーと、ハンドラーで判定する失敗を
/// HTTPレスポンス（エンベロープ形式）へマッピングする。
#[derive(Debug)]
pub enum ApiError {
    /// アプリケーション層のエラー（操作ごとの失敗メッセージ付き）
    Catalog {
        message: &'static str,
        source: CatalogError,
    },
    /// パスやリクエストボディが不正
    BadRequest {
        message: &'static str,
        error: String,
    },
    /// 書籍が存在しない
    BookNotFound,
    /// 現在の状態では操作できない（貸出・返却）
    Rejected {
        message: &'static str,
        error: &'static str,
    },
}

impl ApiError {
    pub fn catalog(message: &'static str) -> impl FnOnce(CatalogError) -> ApiError {
        move |source| ApiError::Catalog { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self {
            ApiError::Catalog { message, source } => match source {
                // 404 Not Found - リクエストされた書籍が存在しない
                CatalogError::BookNotFound => (
                    StatusCode::NOT_FOUND,
                    "Book not found",
                    source.to_string(),
                ),

                // 400 Bad Request - 入力値の不正、ISBNの重複
                CatalogError::DuplicateIsbn(_) | CatalogError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, message, source.to_string())
                }

                // 500 Internal Server Error - システム障害
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                CatalogError::StoreError(ref e) => {
                    tracing::error!(error.cause_chain = ?e, "{}: {}", message, e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        message,
                        "An unexpected error occurred".to_string(),
                    )
                }
            },
            ApiError::BadRequest { message, error } => (StatusCode::BAD_REQUEST, message, error),
            ApiError::BookNotFound => (
                StatusCode::NOT_FOUND,
                "Book not found",
                "Book not found".to_string(),
            ),
            ApiError::Rejected { message, error } => {
                (StatusCode::BAD_REQUEST, message, error.to_string())
            }
        };

        let body = Json(ApiResponse::<()>::failure(error, message, status.as_u16()));
        (status, body).into_response()
    }
}
