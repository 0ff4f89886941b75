//! Persistence interface for books and its storage adapters.

use async_trait::async_trait;
use bookstore_http::error::AppError;
use thiserror::Error;

use super::models::{Book, NewBook};

mod memory;
mod postgres;

pub use memory::InMemoryBookRepository;
pub use postgres::{PgBookRepository, CREATE_BOOKS_TABLE};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        AppError::Internal(anyhow::Error::new(error))
    }
}

/// Storage for book records. Soft-deleted rows are invisible to every read.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a new record; the store assigns the id and timestamps.
    async fn insert(&self, book: NewBook) -> RepositoryResult<Book>;

    /// All active records, in store-defined order.
    async fn find_all(&self) -> RepositoryResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>>;

    /// Full-record save, inserting or replacing by id.
    async fn save(&self, book: &Book) -> RepositoryResult<Book>;

    /// Soft-delete by id. Returns the number of rows affected.
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<u64>;
}
