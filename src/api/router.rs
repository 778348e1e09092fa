use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, check_out_book, create_book, delete_book, get_book, list_books, return_book,
    update_book,
};

/// Creates the API router with all book catalog endpoints
///
/// Query endpoints:
/// - GET /books - List all books
/// - GET /books/:id - Get a book
///
/// Command endpoints:
/// - POST /books - Create a book
/// - PUT /books/:id - Update a book
/// - DELETE /books/:id - Delete a book
/// - POST /books/:id/checkout - Check out one unit
/// - POST /books/:id/return - Return a checked-out unit
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/:id/checkout", post(check_out_book))
        .route("/books/:id/return", post(return_book))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
