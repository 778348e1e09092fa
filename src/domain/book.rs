use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AUTHOR_MAX_LEN, BookId, BookValidationError, COUNT_MAX, ISBN_MAX_LEN, PUBLISHER_MAX_LEN,
    TITLE_MAX_LEN,
};

/// Book集約 - カタログ上の1タイトル
///
/// 在庫は冊数のカウントのみで管理し、1冊ごとの貸出は追跡しない。
/// `checked_out_date`は書籍ごとに1つだけで、最後の貸出が未返却であることを表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    // 識別子
    pub id: BookId,

    // 書誌情報
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub pages: u32,

    // 貸出管理
    pub units_available: u32,
    pub checked_out_date: Option<DateTime<Utc>>,

    // 監査情報（作成後は不変）
    pub created_date: DateTime<Utc>,
}

impl Book {
    /// 未返却の貸出があるか
    pub fn is_checked_out(&self) -> bool {
        self.checked_out_date.is_some()
    }

    /// 貸出可能な在庫があるか
    pub fn has_units_available(&self) -> bool {
        self.units_available > 0
    }

    /// 書誌情報と在庫数を下書きの内容で置き換えた書籍を返す
    ///
    /// ID・作成日時・貸出日時は引き継ぐ。
    pub fn revise(&self, draft: BookDraft) -> Book {
        Book {
            id: self.id,
            title: draft.title,
            author: draft.author,
            isbn: draft.isbn,
            publisher: draft.publisher,
            pages: draft.pages,
            units_available: draft.units_available,
            checked_out_date: self.checked_out_date,
            created_date: self.created_date,
        }
    }
}

/// 書籍の下書き - 登録・更新時にクライアントが指定する項目
///
/// IDと作成日時はストアが付与し、新規書籍は貸出記録なしで始まる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub pages: u32,
    pub units_available: u32,
}

impl BookDraft {
    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_text("Title", &self.title, TITLE_MAX_LEN)?;
        validate_text("Author", &self.author, AUTHOR_MAX_LEN)?;
        validate_text("ISBN", &self.isbn, ISBN_MAX_LEN)?;
        validate_text("Publisher", &self.publisher, PUBLISHER_MAX_LEN)?;
        validate_count("Pages", self.pages)?;
        validate_count("UnitsAvailable", self.units_available)?;
        Ok(())
    }
}

/// 空白のみの文字列は空とみなす。長さは文字数で数える。
fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), BookValidationError> {
    if value.trim().is_empty() {
        return Err(BookValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(BookValidationError::TooLong { field, max });
    }
    Ok(())
}

fn validate_count(field: &'static str, value: u32) -> Result<(), BookValidationError> {
    if value > COUNT_MAX {
        return Err(BookValidationError::OutOfRange {
            field,
            max: COUNT_MAX,
        });
    }
    Ok(())
}
