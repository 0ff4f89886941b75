//! PostgreSQL connection pool factory and module migration runner.

use std::time::Duration;

use anyhow::{anyhow, Context};
use bookstore_kernel::{settings::DatabaseSettings, Migration};
use sqlx::{postgres::PgPoolOptions, PgPool};

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module     TEXT        NOT NULL,
        id         TEXT        NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (module, id)
    )
"#;

/// Create a PostgreSQL connection pool from the database settings.
pub async fn create_pool(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let url = settings
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("database.url is not configured"))?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .connect(url)
        .await
        .with_context(|| {
            format!(
                "failed to connect to database at '{}'",
                sanitize_connection_url(url)
            )
        })?;

    tracing::info!(
        target: "bookstore-db",
        max = settings.max_connections,
        min = settings.min_connections,
        "database connection pool created"
    );

    Ok(pool)
}

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns the number of migrations applied.
pub async fn run_migrations(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create schema_migrations table")?;

    let mut applied = 0;

    for (module, migration) in migrations {
        let already_applied: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM schema_migrations WHERE module = $1 AND id = $2)",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to read migration state for {module}/{}", migration.id))?;

        if already_applied {
            tracing::debug!(target: "bookstore-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {module}/{} failed", migration.id))?;

        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration {module}/{}", migration.id))?;

        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {module}/{}", migration.id))?;

        tracing::info!(target: "bookstore-db", module = %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

/// Sanitize connection URL for safe logging (remove password)
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        let credentials = &url[scheme_end + 3..at_pos];
        if let Some(colon_pos) = credentials.find(':') {
            let username = &credentials[..colon_pos];
            return format!("{}{}:***{}", &url[..scheme_end + 3], username, &url[at_pos..]);
        }
    }
    url.to_string()
}
