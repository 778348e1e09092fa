use crate::domain::{Book, BookDraft, BookId};
use crate::ports::book_store::{
    BookStore as BookStoreTrait, BookStoreError, Result, Transition,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    books: BTreeMap<BookId, Book>,
    last_id: i32,
}

/// BookStoreのインメモリ実装
///
/// テストとデータベースなしでの起動に使用する。
/// すべての操作を1つのMutexの中で行うため、ISBNの確認と挿入、
/// および貸出・返却の読み込みと書き戻しは不可分になる。
pub struct BookStore {
    state: Mutex<State>,
}

impl BookStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// テスト用に書籍を直接登録する
    ///
    /// IDは採番済みの最大値より大きくなるように調整される。
    pub fn insert(&self, book: Book) {
        let mut state = self.lock();
        state.last_id = state.last_id.max(book.id.value());
        state.books.insert(book.id, book);
    }

    /// 登録されている書籍の件数
    pub fn len(&self) -> usize {
        self.lock().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // パニックしたテストの後もストアを使えるようにする
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

fn isbn_taken(state: &State, isbn: &str, except: Option<BookId>) -> bool {
    state
        .books
        .values()
        .any(|book| book.isbn == isbn && Some(book.id) != except)
}

#[async_trait]
impl BookStoreTrait for BookStore {
    async fn get_all(&self) -> Result<Vec<Book>> {
        Ok(self.lock().books.values().cloned().collect())
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.lock().books.get(&id).cloned())
    }

    async fn create(&self, draft: BookDraft) -> Result<Book> {
        let mut state = self.lock();

        if isbn_taken(&state, &draft.isbn, None) {
            return Err(BookStoreError::DuplicateKey(draft.isbn));
        }

        state.last_id += 1;
        let book = Book {
            id: BookId::new(state.last_id),
            title: draft.title,
            author: draft.author,
            isbn: draft.isbn,
            publisher: draft.publisher,
            pages: draft.pages,
            units_available: draft.units_available,
            checked_out_date: None,
            created_date: Utc::now(),
        };
        state.books.insert(book.id, book.clone());

        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        let mut state = self.lock();

        let created_date = state
            .books
            .get(&book.id)
            .map(|existing| existing.created_date)
            .ok_or(BookStoreError::NotFound(book.id))?;

        if isbn_taken(&state, &book.isbn, Some(book.id)) {
            return Err(BookStoreError::DuplicateKey(book.isbn.clone()));
        }

        let stored = Book {
            created_date,
            ..book.clone()
        };
        state.books.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn delete(&self, id: BookId) -> Result<()> {
        self.lock()
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(BookStoreError::NotFound(id))
    }

    async fn isbn_exists(&self, isbn: &str) -> Result<bool> {
        Ok(isbn_taken(&self.lock(), isbn, None))
    }

    async fn update_with(&self, id: BookId, transition: Transition<'_>) -> Result<Option<Book>> {
        let mut state = self.lock();

        let current = state.books.get(&id).ok_or(BookStoreError::NotFound(id))?;

        match transition(current) {
            Some(next) => {
                if isbn_taken(&state, &next.isbn, Some(id)) {
                    return Err(BookStoreError::DuplicateKey(next.isbn));
                }

                let stored = Book {
                    id,
                    created_date: current.created_date,
                    ..next
                };
                state.books.insert(id, stored.clone());
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(isbn: &str) -> BookDraft {
        BookDraft {
            title: "Test Book".to_string(),
            author: "Test Author".to_string(),
            isbn: isbn.to_string(),
            publisher: "Test Publisher".to_string(),
            pages: 100,
            units_available: 1,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = BookStore::new();

        let first = store.create(draft("1")).await.unwrap();
        let second = store.create(draft("2")).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.checked_out_date, None);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_create_duplicate_isbn_writes_nothing() {
        let store = BookStore::new();
        store.create(draft("123")).await.unwrap();

        let result = store.create(draft("123")).await;

        assert!(matches!(result, Err(BookStoreError::DuplicateKey(isbn)) if isbn == "123"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_created_date() {
        let store = BookStore::new();
        let book = store.create(draft("123")).await.unwrap();

        let changed = Book {
            title: "Changed".to_string(),
            created_date: Utc::now() + chrono::Duration::days(1),
            ..book.clone()
        };
        let stored = store.update(&changed).await.unwrap();

        assert_eq!(stored.title, "Changed");
        assert_eq!(stored.created_date, book.created_date);
    }

    #[tokio::test]
    async fn test_update_to_existing_isbn_is_rejected() {
        let store = BookStore::new();
        store.create(draft("1")).await.unwrap();
        let second = store.create(draft("2")).await.unwrap();

        let changed = Book {
            isbn: "1".to_string(),
            ..second
        };

        assert!(matches!(
            store.update(&changed).await,
            Err(BookStoreError::DuplicateKey(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let store = BookStore::new();
        let mut book = store.create(draft("1")).await.unwrap();
        book.id = BookId::new(99);

        assert!(matches!(
            store.update(&book).await,
            Err(BookStoreError::NotFound(id)) if id == BookId::new(99)
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_book_is_not_found() {
        let store = BookStore::new();

        assert!(matches!(
            store.delete(BookId::new(1)).await,
            Err(BookStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_with_declined_transition_leaves_book() {
        let store = BookStore::new();
        let book = store.create(draft("1")).await.unwrap();

        let result = store.update_with(book.id, &|_| None).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(store.get_by_id(book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn test_update_with_to_existing_isbn_is_rejected() {
        let store = BookStore::new();
        let first = store.create(draft("1")).await.unwrap();
        let second = store.create(draft("2")).await.unwrap();

        let result = store
            .update_with(second.id, &|book: &Book| {
                Some(Book {
                    isbn: first.isbn.clone(),
                    ..book.clone()
                })
            })
            .await;

        assert!(matches!(result, Err(BookStoreError::DuplicateKey(isbn)) if isbn == "1"));
        assert_eq!(store.get_by_id(second.id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_isbn_exists() {
        let store = BookStore::new();
        let book = store.create(draft("123")).await.unwrap();

        assert!(store.isbn_exists("123").await.unwrap());
        assert!(!store.isbn_exists("456").await.unwrap());

        store.delete(book.id).await.unwrap();
        assert!(!store.isbn_exists("123").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_advances_id_sequence() {
        let store = BookStore::new();
        let created = store.create(draft("1")).await.unwrap();
        store.insert(Book {
            id: BookId::new(10),
            isbn: "10".to_string(),
            ..created
        });

        let next = store.create(draft("11")).await.unwrap();

        assert_eq!(next.id, BookId::new(11));
    }
}
