use thiserror::Error;

/// 書籍フィールドのバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookValidationError {
    /// 必須項目が空
    #[error("The {0} field is required")]
    EmptyField(&'static str),

    /// 最大文字数を超えている
    #[error("The field {field} must be a string with a maximum length of {max}")]
    TooLong { field: &'static str, max: usize },

    /// 数値が範囲外
    #[error("The field {field} must be between 0 and {max}")]
    OutOfRange { field: &'static str, max: u32 },
}

/// 貸出・返却の拒否理由
///
/// 貸出エンジンはエラーを返さない。状態遷移が許されない場合はこの値で拒否を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingRejection {
    /// 貸出可能な在庫がない
    NoUnitsAvailable,
    /// 貸出記録がない
    NotCheckedOut,
}
