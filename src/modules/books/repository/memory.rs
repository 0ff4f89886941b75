use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{BookRepository, RepositoryResult};
use crate::modules::books::models::{Book, NewBook};

#[derive(Default)]
struct Store {
    last_id: i64,
    rows: BTreeMap<i64, Book>,
}

/// Process-local book storage, used when no database is configured.
#[derive(Default)]
pub struct InMemoryBookRepository {
    store: RwLock<Store>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn insert(&self, book: NewBook) -> RepositoryResult<Book> {
        let mut store = self.store.write().await;
        store.last_id += 1;

        let now = OffsetDateTime::now_utc();
        let book = Book {
            id: store.last_id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.rows.insert(book.id, book.clone());

        Ok(book)
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Book>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .filter(|book| book.is_active())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>> {
        let store = self.store.read().await;
        Ok(store.rows.get(&id).filter(|book| book.is_active()).cloned())
    }

    async fn save(&self, book: &Book) -> RepositoryResult<Book> {
        let mut store = self.store.write().await;
        let now = OffsetDateTime::now_utc();

        let saved = match store.rows.get(&book.id) {
            Some(existing) => Book {
                title: book.title.clone(),
                author: book.author.clone(),
                isbn: book.isbn.clone(),
                updated_at: now,
                ..existing.clone()
            },
            None => Book {
                updated_at: now,
                deleted_at: None,
                ..book.clone()
            },
        };

        store.last_id = store.last_id.max(saved.id);
        store.rows.insert(saved.id, saved.clone());

        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<u64> {
        let mut store = self.store.write().await;
        match store.rows.get_mut(&id) {
            Some(book) if book.is_active() => {
                book.deleted_at = Some(OffsetDateTime::now_utc());
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
