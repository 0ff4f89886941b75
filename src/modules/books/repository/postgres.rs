use async_trait::async_trait;
use once_cell::sync::Lazy;
use sqlx::PgPool;

use super::{BookRepository, RepositoryResult};
use crate::modules::books::models::{Book, NewBook};

const COLUMNS: &str = "id, title, author, isbn, created_at, updated_at, deleted_at";

/// Predicate composed into every read.
const ACTIVE_ONLY: &str = "deleted_at IS NULL";

static INSERT: Lazy<String> = Lazy::new(|| {
    format!("INSERT INTO books (title, author, isbn) VALUES ($1, $2, $3) RETURNING {COLUMNS}")
});

static FIND_ALL: Lazy<String> =
    Lazy::new(|| format!("SELECT {COLUMNS} FROM books WHERE {ACTIVE_ONLY}"));

static FIND_BY_ID: Lazy<String> =
    Lazy::new(|| format!("SELECT {COLUMNS} FROM books WHERE id = $1 AND {ACTIVE_ONLY}"));

static SAVE: Lazy<String> = Lazy::new(|| {
    format!(
        "INSERT INTO books (id, title, author, isbn, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, now()) \
         ON CONFLICT (id) DO UPDATE SET \
             title = EXCLUDED.title, \
             author = EXCLUDED.author, \
             isbn = EXCLUDED.isbn, \
             updated_at = EXCLUDED.updated_at \
         RETURNING {COLUMNS}"
    )
});

static SOFT_DELETE: Lazy<String> = Lazy::new(|| {
    format!("UPDATE books SET deleted_at = now() WHERE id = $1 AND {ACTIVE_ONLY}")
});

pub const CREATE_BOOKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id         BIGSERIAL   PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at TIMESTAMPTZ NULL,
        title      TEXT        NOT NULL,
        author     TEXT        NOT NULL,
        isbn       TEXT        NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_books_deleted_at ON books (deleted_at);
"#;

/// PostgreSQL-backed book storage.
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn insert(&self, book: NewBook) -> RepositoryResult<Book> {
        let book = sqlx::query_as::<_, Book>(&INSERT)
            .bind(book.title)
            .bind(book.author)
            .bind(book.isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&FIND_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&FIND_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn save(&self, book: &Book) -> RepositoryResult<Book> {
        let saved = sqlx::query_as::<_, Book>(&SAVE)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(book.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<u64> {
        let result = sqlx::query(&SOFT_DELETE)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
