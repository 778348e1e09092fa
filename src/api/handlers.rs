use crate::application::catalog::{self, ServiceDependencies};
use crate::domain::BookId;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{ApiResponse, BookRequest, BookResponse},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// パスの書籍IDを取り出す
///
/// 整数でない場合は400を返す。
fn book_id(
    path: Result<Path<i32>, PathRejection>,
    message: &'static str,
) -> Result<BookId, ApiError> {
    match path {
        Ok(Path(id)) => Ok(BookId::new(id)),
        Err(rejection) => Err(ApiError::BadRequest {
            message,
            error: rejection.body_text(),
        }),
    }
}

fn request_body(
    payload: Result<Json<BookRequest>, JsonRejection>,
    message: &'static str,
) -> Result<BookRequest, ApiError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => Err(ApiError::BadRequest {
            message,
            error: rejection.body_text(),
        }),
    }
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /books - 全書籍を取得
pub async fn list_books(State(state): State<Arc<AppState>>) -> ApiResult<Vec<BookResponse>> {
    let books = catalog::list_books(&state.service_deps)
        .await
        .map_err(ApiError::catalog("Failed to retrieve books"))?;

    let books = books.into_iter().map(BookResponse::from).collect();

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            books,
            "Books retrieved successfully",
            200,
        )),
    ))
}

/// GET /books/:id - 書籍をIDで取得
///
/// 見つからない場合は404を返す。
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<BookResponse> {
    let id = book_id(path, "Failed to retrieve book")?;

    let book = catalog::get_book(&state.service_deps, id)
        .await
        .map_err(ApiError::catalog("Failed to retrieve book"))?
        .ok_or(ApiError::BookNotFound)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            BookResponse::from(book),
            "Book retrieved successfully",
            200,
        )),
    ))
}

// ============================================================================
// Command handlers (POST / PUT / DELETE)
// ============================================================================

/// POST /books - 書籍を登録
///
/// 入力値が不正な場合、ISBNが重複する場合は400を返す。
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> ApiResult<BookResponse> {
    const FAILED: &str = "Failed to create book";

    let draft = request_body(payload, FAILED)?.into_draft();

    let book = catalog::create_book(&state.service_deps, draft)
        .await
        .map_err(ApiError::catalog(FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            BookResponse::from(book),
            "Book created successfully",
            201,
        )),
    ))
}

/// PUT /books/:id - 書籍の書誌情報と在庫数を更新
///
/// 貸出日時と作成日時は変更しない。
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> ApiResult<BookResponse> {
    const FAILED: &str = "Failed to update book";

    let id = book_id(path, FAILED)?;
    let draft = request_body(payload, FAILED)?.into_draft();

    let book = catalog::update_book(&state.service_deps, id, draft)
        .await
        .map_err(ApiError::catalog(FAILED))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            BookResponse::from(book),
            "Book updated successfully",
            200,
        )),
    ))
}

/// DELETE /books/:id - 書籍を削除
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<()> {
    const FAILED: &str = "Failed to delete book";

    let id = book_id(path, FAILED)?;

    catalog::delete_book(&state.service_deps, id)
        .await
        .map_err(ApiError::catalog(FAILED))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::empty("Book deleted successfully", 200)),
    ))
}

/// POST /books/:id/checkout - 書籍を貸し出す
///
/// 書籍が存在しない場合も在庫がない場合も400を返す。
pub async fn check_out_book(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<BookResponse> {
    let id = book_id(path, "Checkout failed")?;

    let book = catalog::check_out_book(&state.service_deps, id)
        .await
        .map_err(ApiError::catalog("Failed to checkout book"))?
        .ok_or(ApiError::Rejected {
            message: "Checkout failed",
            error: "Book not available for checkout",
        })?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            BookResponse::from(book),
            "Book checked out successfully",
            200,
        )),
    ))
}

/// POST /books/:id/return - 書籍を返却する
///
/// 書籍が存在しない場合も貸出記録がない場合も400を返す。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<BookResponse> {
    let id = book_id(path, "Return failed")?;

    let book = catalog::return_book(&state.service_deps, id)
        .await
        .map_err(ApiError::catalog("Failed to return book"))?
        .ok_or(ApiError::Rejected {
            message: "Return failed",
            error: "Book was not checked out",
        })?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            BookResponse::from(book),
            "Book returned successfully",
            200,
        )),
    ))
}
