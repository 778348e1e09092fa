use chrono::{DateTime, Utc};

use super::{Book, COUNT_MAX, LendingRejection};

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 在庫（units_available）が1冊以上あること
/// - 貸出時：在庫を1減らし、貸出日時を記録する
///
/// 副作用なし。拒否された場合、元の書籍は変更されない。
pub fn try_check_out(book: &Book, now: DateTime<Utc>) -> Result<Book, LendingRejection> {
    if !book.has_units_available() {
        return Err(LendingRejection::NoUnitsAvailable);
    }

    Ok(Book {
        units_available: book.units_available - 1,
        checked_out_date: Some(now),
        ..book.clone()
    })
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 貸出記録（checked_out_date）があること
/// - 返却時：在庫を1増やし、貸出日時をクリアする
/// - 在庫数は`COUNT_MAX`を超えない
///
/// 副作用なし。拒否された場合、元の書籍は変更されない。
pub fn try_return(book: &Book) -> Result<Book, LendingRejection> {
    if !book.is_checked_out() {
        return Err(LendingRejection::NotCheckedOut);
    }

    Ok(Book {
        units_available: book.units_available.saturating_add(1).min(COUNT_MAX),
        checked_out_date: None,
        ..book.clone()
    })
}
