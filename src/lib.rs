//! Bookstore application library
//!
//! Wires the books module to its storage backend and hands the resulting
//! registry to the HTTP host.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::PgPool;

use modules::books::repository::{BookRepository, InMemoryBookRepository, PgBookRepository};

/// Modules plus the database pool backing them, if any
pub struct Application {
    registry: ModuleRegistry,
    pool: Option<PgPool>,
}

impl Application {
    /// Connect to PostgreSQL when `database.url` is set, otherwise fall back
    /// to the in-memory store.
    pub async fn build(settings: &Settings) -> anyhow::Result<Self> {
        let pool = match settings.database.url {
            Some(_) => Some(
                bookstore_db::create_pool(&settings.database)
                    .await
                    .context("failed to create database pool")?,
            ),
            None => {
                tracing::warn!("database.url is not set; books are kept in memory only");
                None
            }
        };

        let books: Arc<dyn BookRepository> = match &pool {
            Some(pool) => Arc::new(PgBookRepository::new(pool.clone())),
            None => Arc::new(InMemoryBookRepository::new()),
        };

        Ok(Self::with_repository(books, pool))
    }

    /// Assemble the application around an explicit books repository
    pub fn with_repository(books: Arc<dyn BookRepository>, pool: Option<PgPool>) -> Self {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, books);
        Self { registry, pool }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Apply pending migrations. Returns how many ran; always 0 without a database.
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };

        let applied = bookstore_db::run_migrations(pool, &self.registry.collect_migrations())
            .await
            .context("failed to run migrations")?;

        tracing::info!(applied, "migrations complete");
        Ok(applied)
    }

    /// Run the module lifecycle around the HTTP server
    pub async fn run(self, settings: &Settings) -> anyhow::Result<()> {
        let ctx = InitCtx { settings };

        self.registry.init_modules(&ctx).await?;
        self.migrate().await?;
        self.registry.start_modules(&ctx).await?;

        let served = bookstore_http::start_server(&self.registry, settings).await;

        self.registry.stop_modules().await?;
        if let Some(pool) = &self.pool {
            pool.close().await;
        }

        served
    }
}
