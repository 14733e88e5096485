//! Embedded schema migrations
//!
//! Migrations are plain SQL strings applied in order; applied versions
//! are tracked in `schema_migrations` so startup is idempotent.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

struct Migration {
    version: i64,
    name: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                salutation TEXT NOT NULL,
                last_name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                birth_date TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                phone TEXT NOT NULL,
                street_number TEXT,
                street TEXT,
                postal_code INTEGER,
                city TEXT,
                country TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
    },
    Migration {
        version: 2,
        name: "create_creators",
        up: "CREATE TABLE creators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                salutation TEXT NOT NULL,
                last_name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                birth_date TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                phone TEXT NOT NULL,
                street_number TEXT,
                street TEXT,
                postal_code INTEGER,
                city TEXT,
                country TEXT,
                business_started_on TEXT,
                siret BIGINT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
    },
    Migration {
        version: 3,
        name: "create_articles",
        up: "CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                photo_path TEXT,
                price REAL NOT NULL,
                reference BIGINT NOT NULL,
                size TEXT NOT NULL,
                color TEXT NOT NULL,
                category TEXT NOT NULL,
                creator_id INTEGER NOT NULL REFERENCES creators(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX idx_articles_category ON articles(category);
            CREATE INDEX idx_articles_creator_id ON articles(creator_id)",
    },
    Migration {
        version: 4,
        name: "create_sessions",
        up: "CREATE TABLE sessions (
                token TEXT PRIMARY KEY,
                principal_kind TEXT NOT NULL,
                principal_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX idx_sessions_principal ON sessions(principal_kind, principal_id)",
    },
];

/// Apply all pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    for migration in MIGRATIONS {
        let applied: Option<(i64,)> =
            sqlx::query_as("SELECT version FROM schema_migrations WHERE version = ?")
                .bind(migration.version)
                .fetch_optional(pool)
                .await
                .context("Failed to query schema_migrations")?;

        if applied.is_some() {
            continue;
        }

        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        // A migration may hold several statements separated by ';'.
        for statement in migration.up.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement).execute(&mut *tx).await.with_context(|| {
                format!(
                    "Failed to apply migration {} ({})",
                    migration.version, migration.name
                )
            })?;
        }

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await
            .context("Failed to record migration")?;

        tx.commit().await.context("Failed to commit migration")?;
        info!(version = migration.version, name = migration.name, "Applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::create_test_pool;

    #[tokio::test]
    async fn test_migrations_create_all_tables() {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("migrations");

        for table in ["users", "creators", "articles", "sessions"] {
            let row: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .expect("query");
            assert_eq!(row.0, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("first run");
        run_migrations(&pool).await.expect("second run");

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(row.0, MIGRATIONS.len() as i64);
    }
}
