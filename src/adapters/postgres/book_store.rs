use crate::domain::{Book, BookDraft, BookId};
use crate::ports::book_store::{
    BookStore as BookStoreTrait, BookStoreError, Result, Transition,
};
use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};

/// 負の値や範囲外の値が入った列を不正データとして扱う
fn invalid_data(message: String) -> BookStoreError {
    BookStoreError::unavailable(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    ))
}

fn column_to_u32(row: &PgRow, column: &str) -> Result<u32> {
    let value: i32 = row.try_get(column).map_err(BookStoreError::unavailable)?;
    u32::try_from(value).map_err(|_| invalid_data(format!("{} out of range: {}", column, value)))
}

fn u32_to_column(column: &str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| invalid_data(format!("{} out of range: {}", column, value)))
}

/// PostgreSQLの行データをBookに変換する
///
/// pagesとunits_availableはINTEGER列なので、u32への変換でエラーハンドリングを行う。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let id: i32 = row.try_get("id").map_err(BookStoreError::unavailable)?;

    Ok(Book {
        id: BookId::new(id),
        title: row.try_get("title").map_err(BookStoreError::unavailable)?,
        author: row.try_get("author").map_err(BookStoreError::unavailable)?,
        isbn: row.try_get("isbn").map_err(BookStoreError::unavailable)?,
        publisher: row.try_get("publisher").map_err(BookStoreError::unavailable)?,
        pages: column_to_u32(row, "pages")?,
        units_available: column_to_u32(row, "units_available")?,
        checked_out_date: row
            .try_get("checked_out_date")
            .map_err(BookStoreError::unavailable)?,
        created_date: row
            .try_get("created_date")
            .map_err(BookStoreError::unavailable)?,
    })
}

/// 書き込み系クエリのエラーを変換する
///
/// 一意制約違反（ix_books_isbn）は`DuplicateKey`、それ以外は`Unavailable`とする。
fn map_write_error(err: sqlx::Error, isbn: &str) -> BookStoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return BookStoreError::DuplicateKey(isbn.to_string());
        }
    }
    BookStoreError::unavailable(err)
}

/// 作成日時以外の全項目を書き戻す
///
/// 対象の行が存在しない場合は`None`を返す。
async fn update_row<'e>(executor: impl PgExecutor<'e>, book: &Book) -> Result<Option<Book>> {
    let row = sqlx::query(
        r#"
        UPDATE books
        SET
            title = $2,
            author = $3,
            isbn = $4,
            publisher = $5,
            pages = $6,
            units_available = $7,
            checked_out_date = $8
        WHERE id = $1
        RETURNING
            id,
            title,
            author,
            isbn,
            publisher,
            pages,
            units_available,
            checked_out_date,
            created_date
        "#,
    )
    .bind(book.id.value())
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.isbn)
    .bind(&book.publisher)
    .bind(u32_to_column("pages", book.pages)?)
    .bind(u32_to_column("units_available", book.units_available)?)
    .bind(book.checked_out_date)
    .fetch_optional(executor)
    .await
    .map_err(|e| map_write_error(e, &book.isbn))?;

    row.as_ref().map(map_row_to_book).transpose()
}

/// BookStoreのPostgreSQL実装
///
/// booksテーブルとISBNの一意インデックス（ix_books_isbn）を前提とする。
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    /// PostgreSQLコネクションプールから新しいBookStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStoreTrait for BookStore {
    /// 全書籍を取得（ID順）
    async fn get_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                title,
                author,
                isbn,
                publisher,
                pages,
                units_available,
                checked_out_date,
                created_date
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(BookStoreError::unavailable)?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                title,
                author,
                isbn,
                publisher,
                pages,
                units_available,
                checked_out_date,
                created_date
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(BookStoreError::unavailable)?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書籍を登録
    ///
    /// ISBNの重複は一意インデックスで検出するため、事前チェックとの競合は起きない。
    /// IDと作成日時はデータベースのデフォルト値で採番される。
    async fn create(&self, draft: BookDraft) -> Result<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (
                title,
                author,
                isbn,
                publisher,
                pages,
                units_available
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                id,
                title,
                author,
                isbn,
                publisher,
                pages,
                units_available,
                checked_out_date,
                created_date
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.isbn)
        .bind(&draft.publisher)
        .bind(u32_to_column("pages", draft.pages)?)
        .bind(u32_to_column("units_available", draft.units_available)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &draft.isbn))?;

        map_row_to_book(&row)
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        update_row(&self.pool, book)
            .await?
            .ok_or(BookStoreError::NotFound(book.id))
    }

    async fn delete(&self, id: BookId) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(BookStoreError::unavailable)?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::NotFound(id));
        }

        Ok(())
    }

    async fn isbn_exists(&self, isbn: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await
            .map_err(BookStoreError::unavailable)
    }

    /// 行ロック（SELECT ... FOR UPDATE）を取ってから遷移関数を適用する
    ///
    /// 同じ書籍への並行した貸出はロックの解放を待つため、
    /// 古い在庫数を元に書き戻すことはない。
    async fn update_with(&self, id: BookId, transition: Transition<'_>) -> Result<Option<Book>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(BookStoreError::unavailable)?;

        let row = sqlx::query(
            r#"
            SELECT
                id,
                title,
                author,
                isbn,
                publisher,
                pages,
                units_available,
                checked_out_date,
                created_date
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.value())
        .fetch_optional(&mut *tx)
        .await
        .map_err(BookStoreError::unavailable)?;

        let current = match row {
            Some(row) => map_row_to_book(&row)?,
            None => return Err(BookStoreError::NotFound(id)),
        };

        // 遷移しない場合はトランザクションをドロップしてロールバックする
        let Some(next) = transition(&current) else {
            return Ok(None);
        };

        let next = Book { id, ..next };
        let stored = update_row(&mut *tx, &next)
            .await?
            .ok_or(BookStoreError::NotFound(id))?;

        tx.commit().await.map_err(BookStoreError::unavailable)?;

        Ok(Some(stored))
    }
}
