use crate::domain::{Book, BookDraft, BookId};
use async_trait::async_trait;
use thiserror::Error;

/// 書籍ストアのエラー
#[derive(Debug, Error)]
pub enum BookStoreError {
    /// 指定IDの書籍が存在しない
    #[error("Book {0} not found")]
    NotFound(BookId),

    /// ISBNの一意制約違反
    #[error("A book with ISBN '{0}' already exists")]
    DuplicateKey(String),

    /// ストアに到達できない、タイムアウト、キャンセル、不正な行データなど
    #[error("Book store unavailable")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BookStoreError {
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        BookStoreError::Unavailable(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, BookStoreError>;

/// 読み込んだ書籍から次の状態を計算する遷移関数
///
/// `None`を返すと書籍は変更されない。
pub type Transition<'a> = &'a (dyn Fn(&Book) -> Option<Book> + Send + Sync);

/// 書籍ストアポート
///
/// Book集約の永続化を抽象化する。
/// ISBNの一意性はストレージ層の制約で保証し、アプリケーション側の事前チェックには頼らない。
#[async_trait]
pub trait BookStore: Send + Sync {
    /// すべての書籍を取得する
    ///
    /// 順序は保証しない。
    async fn get_all(&self) -> Result<Vec<Book>>;

    /// IDで書籍を取得する
    ///
    /// 存在しない場合はエラーではなく`None`を返す。
    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>>;

    /// 書籍を登録する
    ///
    /// IDと作成日時はストアが付与する。
    /// ISBNが既に存在する場合は`DuplicateKey`を返し、何も書き込まない。
    async fn create(&self, draft: BookDraft) -> Result<Book>;

    /// 既存の書籍の全項目を保存する
    ///
    /// 作成日時は上書きしない。
    /// 存在しない場合は`NotFound`、ISBNが他の書籍と重複する場合は`DuplicateKey`を返す。
    async fn update(&self, book: &Book) -> Result<Book>;

    /// 書籍を物理削除する
    ///
    /// 存在しない場合は`NotFound`を返す。
    async fn delete(&self, id: BookId) -> Result<()>;

    /// ISBNが登録済みか確認する
    ///
    /// 診断用。一意性の保証には使わないこと（`create`を参照）。
    async fn isbn_exists(&self, isbn: &str) -> Result<bool>;

    /// 書籍を読み込み、遷移関数の結果を書き戻す（read-modify-write）
    ///
    /// 読み込みから書き戻しまでを1つのトランザクションで行い、
    /// 同じ書籍への並行した貸出・返却が在庫数を取り違えないようにする。
    ///
    /// 存在しない場合は`NotFound`、遷移関数が`None`を返した場合は`Ok(None)`を返す。
    async fn update_with(&self, id: BookId, transition: Transition<'_>) -> Result<Option<Book>>;
}
