use serde::{Deserialize, Serialize};
use std::fmt;

/// 書籍ID - ストアが採番する整数の主キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i32);

impl BookId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for BookId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// タイトルの最大文字数
pub const TITLE_MAX_LEN: usize = 200;
/// 著者名の最大文字数
pub const AUTHOR_MAX_LEN: usize = 100;
/// 出版社名の最大文字数
pub const PUBLISHER_MAX_LEN: usize = 100;
/// ISBNの最大文字数
pub const ISBN_MAX_LEN: usize = 20;
/// ページ数・在庫数の上限（INTEGER列に収まる値）
pub const COUNT_MAX: u32 = i32::MAX as u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_id_value() {
        let id = BookId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(BookId::from(42), id);
    }

    #[test]
    fn test_book_id_display() {
        assert_eq!(BookId::new(7).to_string(), "7");
    }

    #[test]
    fn test_book_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&BookId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
