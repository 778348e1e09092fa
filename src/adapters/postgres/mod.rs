pub mod book_store;

// パブリックに型を再エクスポート
pub use book_store::BookStore as PostgresBookStore;
