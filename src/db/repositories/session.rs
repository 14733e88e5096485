//! Session repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{PrincipalKind, Session};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<()>;
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>>;
    async fn delete(&self, token: &str) -> Result<()>;
    async fn delete_for_principal(&self, kind: PrincipalKind, principal_id: i64) -> Result<()>;
    async fn delete_expired(&self) -> Result<u64>;
}

pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

fn row_to_session(row: &SqliteRow) -> Result<Session> {
    let kind: String = row
        .try_get("principal_kind")
        .context("Missing principal_kind column")?;
    let principal_kind = PrincipalKind::from_str(&kind)
        .with_context(|| format!("Unknown principal kind: {}", kind))?;

    Ok(Session {
        token: row.try_get("token").context("Missing token column")?,
        principal_kind,
        principal_id: row
            .try_get("principal_id")
            .context("Missing principal_id column")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .context("Missing created_at column")?,
        expires_at: row
            .try_get::<DateTime<Utc>, _>("expires_at")
            .context("Missing expires_at column")?,
    })
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token, principal_kind, principal_id, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.principal_kind.as_str())
        .bind(session.principal_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert session")?;

        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch session")?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    async fn delete_for_principal(&self, kind: PrincipalKind, principal_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE principal_kind = ? AND principal_id = ?")
            .bind(kind.as_str())
            .bind(principal_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete principal sessions")?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use chrono::Duration;

    async fn setup() -> SqlxSessionRepository {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        SqlxSessionRepository::new(pool)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let repo = setup().await;
        let session = Session::issue(PrincipalKind::Creator, 7, Duration::days(7));
        repo.create(&session).await.expect("create");

        let stored = repo
            .get_by_token(&session.token)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(stored.principal_kind, PrincipalKind::Creator);
        assert_eq!(stored.principal_id, 7);

        repo.delete(&session.token).await.expect("delete");
        assert!(repo
            .get_by_token(&session.token)
            .await
            .expect("get")
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_for_principal_spares_other_kind() {
        let repo = setup().await;
        let creator_session = Session::issue(PrincipalKind::Creator, 7, Duration::days(7));
        let user_session = Session::issue(PrincipalKind::User, 7, Duration::days(7));
        repo.create(&creator_session).await.expect("create");
        repo.create(&user_session).await.expect("create");

        repo.delete_for_principal(PrincipalKind::Creator, 7)
            .await
            .expect("delete");

        assert!(repo
            .get_by_token(&creator_session.token)
            .await
            .expect("get")
            .is_none());
        assert!(repo
            .get_by_token(&user_session.token)
            .await
            .expect("get")
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let repo = setup().await;
        let live = Session::issue(PrincipalKind::User, 1, Duration::days(7));
        let stale = Session::issue(PrincipalKind::User, 1, Duration::days(-1));
        repo.create(&live).await.expect("create");
        repo.create(&stale).await.expect("create");

        let removed = repo.delete_expired().await.expect("sweep");
        assert_eq!(removed, 1);
        assert!(repo.get_by_token(&live.token).await.expect("get").is_some());
    }
}
