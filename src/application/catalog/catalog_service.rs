use crate::domain::{Book, BookDraft, BookId, lending};
use crate::ports::book_store::{self, BookStore, BookStoreError};
use chrono::Utc;
use std::sync::Arc;

use super::errors::{CatalogError, Result};

/// サービスの依存関係
///
/// 振る舞いは持たず、各ユースケース関数に明示的に渡す。
/// リクエストごとの暗黙的な永続化コンテキストは持たない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_store: Arc<dyn BookStore>,
}

/// 全書籍を取得する
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    Ok(deps.book_store.get_all().await?)
}

/// IDで書籍を取得する
///
/// 存在しない場合は`None`を返す（エラーにはしない）。
pub async fn get_book(deps: &ServiceDependencies, id: BookId) -> Result<Option<Book>> {
    Ok(deps.book_store.get_by_id(id).await?)
}

/// 書籍を登録する
///
/// # エラー
/// - Validation: 必須項目が空、または最大文字数を超えている
/// - DuplicateIsbn: 同じISBNの書籍が既に存在する
pub async fn create_book(deps: &ServiceDependencies, draft: BookDraft) -> Result<Book> {
    draft.validate()?;

    let book = deps.book_store.create(draft).await?;
    tracing::info!(book_id = %book.id, isbn = %book.isbn, "Book created");

    Ok(book)
}

/// 書籍の書誌情報と在庫数を下書きの内容で更新する
///
/// 貸出日時と作成日時は変更しない。読み込みと書き戻しは`update_with`で行うため、
/// 並行した貸出・返却の結果を古い値で上書きしない。
///
/// # エラー
/// - Validation: 入力値が不正
/// - BookNotFound: 書籍が存在しない
/// - DuplicateIsbn: 変更後のISBNが他の書籍と重複する
pub async fn update_book(
    deps: &ServiceDependencies,
    id: BookId,
    draft: BookDraft,
) -> Result<Book> {
    draft.validate()?;

    let book = deps
        .book_store
        .update_with(id, &|book: &Book| Some(book.revise(draft.clone())))
        .await?
        .ok_or(CatalogError::BookNotFound)?;
    tracing::info!(book_id = %book.id, "Book updated");

    Ok(book)
}

/// 書籍を削除する
///
/// 存在しない場合は`BookNotFound`を返す。
pub async fn delete_book(deps: &ServiceDependencies, id: BookId) -> Result<()> {
    deps.book_store.delete(id).await?;
    tracing::info!(book_id = %id, "Book deleted");

    Ok(())
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 在庫が1冊以上あること
///
/// 書籍が存在しない場合と在庫がない場合は、どちらも`None`を返す（呼び出し側では区別しない）。
/// 読み込みと書き戻しはストアの`update_with`で1つのトランザクションとして行う。
pub async fn check_out_book(deps: &ServiceDependencies, id: BookId) -> Result<Option<Book>> {
    let now = Utc::now();

    let outcome = deps
        .book_store
        .update_with(id, &|book: &Book| {
            lending::try_check_out(book, now)
                .inspect_err(|reason| {
                    tracing::debug!(book_id = %book.id, ?reason, "Checkout rejected");
                })
                .ok()
        })
        .await;

    settle_lending(id, outcome)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出記録があること
///
/// `check_out_book`と同様、書籍が存在しない場合と貸出記録がない場合はどちらも`None`を返す。
pub async fn return_book(deps: &ServiceDependencies, id: BookId) -> Result<Option<Book>> {
    let outcome = deps
        .book_store
        .update_with(id, &|book: &Book| {
            lending::try_return(book)
                .inspect_err(|reason| {
                    tracing::debug!(book_id = %book.id, ?reason, "Return rejected");
                })
                .ok()
        })
        .await;

    settle_lending(id, outcome)
}

/// 貸出・返却の結果をまとめる
///
/// NotFoundは拒否と同じ`None`に畳み込み、それ以外のストアエラーはそのまま伝播する。
fn settle_lending(id: BookId, outcome: book_store::Result<Option<Book>>) -> Result<Option<Book>> {
    match outcome {
        Ok(book) => Ok(book),
        Err(BookStoreError::NotFound(_)) => {
            tracing::debug!(book_id = %id, "Book not found for lending");
            Ok(None)
        }
        Err(err) => Err(CatalogError::StoreError(err)),
    }
}
