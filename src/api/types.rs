use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Book, BookDraft};

/// レスポンスエンベロープ
///
/// すべてのエンドポイントは、ステータスコード・メッセージ・データ・エラーを
/// この形式で返す。
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>, code: u16) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// データなしの成功レスポンス（削除など）
    pub fn empty(message: impl Into<String>, code: u16) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>, code: u16) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// 書籍の登録・更新リクエスト（POST /books, PUT /books/:id）
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub units_available: u32,
}

impl BookRequest {
    pub fn into_draft(self) -> BookDraft {
        BookDraft {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publisher: self.publisher,
            pages: self.pages,
            units_available: self.units_available,
        }
    }
}

/// 書籍レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub pages: u32,
    pub units_available: u32,
    pub checked_out_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            publisher: book.publisher,
            pages: book.pages,
            units_available: book.units_available,
            checked_out_date: book.checked_out_date,
            created_date: book.created_date,
        }
    }
}
