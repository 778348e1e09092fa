use crate::domain::BookValidationError;
use crate::ports::BookStoreError;
use thiserror::Error;

/// 書籍カタログアプリケーション層のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// ISBNが既に登録されている
    #[error("ISBN already exists")]
    DuplicateIsbn(String),

    /// 入力値が不正
    #[error("{0}")]
    Validation(#[from] BookValidationError),

    /// BookStoreのエラー（タイムアウト・接続障害など）
    #[error("Book store error")]
    StoreError(#[source] BookStoreError),
}

impl From<BookStoreError> for CatalogError {
    fn from(err: BookStoreError) -> Self {
        match err {
            BookStoreError::NotFound(_) => CatalogError::BookNotFound,
            BookStoreError::DuplicateKey(isbn) => CatalogError::DuplicateIsbn(isbn),
            other => CatalogError::StoreError(other),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, CatalogError>;
