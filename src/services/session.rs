//! Session management
//!
//! Issues opaque bearer tokens, resolves them back to principals, and
//! revokes them on logout. Expired tokens are deleted lazily when seen.

use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;

use crate::db::repositories::SessionRepository;
use crate::models::{PrincipalKind, Session};

const SESSION_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    #[cfg(test)]
    pub fn with_ttl(sessions: Arc<dyn SessionRepository>, ttl: Duration) -> Self {
        Self { sessions, ttl }
    }

    /// Issue and persist a fresh session for a principal.
    pub async fn issue(&self, kind: PrincipalKind, principal_id: i64) -> Result<Session> {
        let session = Session::issue(kind, principal_id, self.ttl);
        self.sessions.create(&session).await?;
        Ok(session)
    }

    /// Resolve a bearer token to its live session.
    ///
    /// An expired session is removed on sight and resolves to `None`,
    /// indistinguishable from a token that never existed.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        let Some(session) = self.sessions.get_by_token(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.sessions.delete(token).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Revoke a single token (logout). Unknown tokens are a no-op.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.sessions.delete(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use crate::db::repositories::SqlxSessionRepository;

    async fn service(ttl: Duration) -> SessionService {
        let pool = create_test_pool().await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        SessionService::with_ttl(SqlxSessionRepository::boxed(pool), ttl)
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let service = service(Duration::days(7)).await;
        let session = service
            .issue(PrincipalKind::Creator, 4)
            .await
            .expect("issue");

        let resolved = service
            .resolve(&session.token)
            .await
            .expect("resolve")
            .expect("live");
        assert_eq!(resolved.principal_kind, PrincipalKind::Creator);
        assert_eq!(resolved.principal_id, 4);
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let service = service(Duration::days(7)).await;
        assert!(service.resolve("no-such-token").await.expect("resolve").is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_deleted_on_resolve() {
        let service = service(Duration::seconds(-1)).await;
        let session = service.issue(PrincipalKind::User, 1).await.expect("issue");

        assert!(service
            .resolve(&session.token)
            .await
            .expect("resolve")
            .is_none());
        // Second resolve hits a missing row, same outcome.
        assert!(service
            .resolve(&session.token)
            .await
            .expect("resolve")
            .is_none());
    }

    #[tokio::test]
    async fn test_revoke_invalidates_token() {
        let service = service(Duration::days(7)).await;
        let session = service.issue(PrincipalKind::User, 1).await.expect("issue");

        service.revoke(&session.token).await.expect("revoke");
        assert!(service
            .resolve(&session.token)
            .await
            .expect("resolve")
            .is_none());

        // Revoking again is harmless.
        service.revoke(&session.token).await.expect("revoke");
    }
}
