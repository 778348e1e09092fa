mod catalog_service;
mod errors;

pub use catalog_service::{
    ServiceDependencies, check_out_book, create_book, delete_book, get_book, list_books,
    return_book, update_book,
};
pub use errors::{CatalogError, Result};
